//! Sleeper for the blocking monitor thread that wakes early on shutdown.

use std::time::Duration;

use nettrack_core::{Cancelled, Sleeper};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Must be used from a blocking thread (`spawn_blocking`), never from
/// inside an async task.
pub struct CancellableSleeper {
    handle: Handle,
    cancel: CancellationToken,
}

impl CancellableSleeper {
    pub fn new(handle: Handle, cancel: CancellationToken) -> Self {
        Self { handle, cancel }
    }
}

impl Sleeper for CancellableSleeper {
    fn sleep(&mut self, duration: Duration) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let cancel = self.cancel.clone();
        self.handle.block_on(async move {
            tokio::select! {
                () = cancel.cancelled() => Err(Cancelled),
                () = tokio::time::sleep(duration) => Ok(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sleeps_full_duration_when_not_cancelled() {
        let mut sleeper = CancellableSleeper::new(Handle::current(), CancellationToken::new());
        let result = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let result = sleeper.sleep(Duration::from_millis(20));
            (result, start.elapsed())
        })
        .await
        .expect("join");
        assert_eq!(result.0, Ok(()));
        assert!(result.1 >= Duration::from_millis(20));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_wakes_long_sleep() {
        let cancel = CancellationToken::new();
        let mut sleeper = CancellableSleeper::new(Handle::current(), cancel.clone());
        let task = tokio::task::spawn_blocking(move || sleeper.sleep(Duration::from_secs(3600)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("sleeper woke up")
            .expect("join");
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut sleeper = CancellableSleeper::new(Handle::current(), cancel);
        let result = tokio::task::spawn_blocking(move || sleeper.sleep(Duration::from_secs(3600)))
            .await
            .expect("join");
        assert_eq!(result, Err(Cancelled));
    }
}

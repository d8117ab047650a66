//! Runs publishes off the monitor thread.
//!
//! The monitor only enqueues a request. The worker owns the real publisher and
//! runs it on a blocking thread, so a slow `git push` never delays probing.
//! Requests that arrive while one is already pending collapse into it; a
//! publish always covers the whole log file, so nothing is lost.

use chrono::Utc;
use nettrack_sink::{PublishError, Publisher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// What the worker did before it stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub published: u64,
    pub failed: u64,
}

/// Sending half handed to the sink adapter.
#[derive(Debug, Clone)]
pub struct QueuedPublisher {
    tx: mpsc::Sender<()>,
}

impl Publisher for QueuedPublisher {
    fn publish(&mut self) -> Result<(), PublishError> {
        match self.tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => Err(PublishError::WorkerStopped),
        }
    }
}

/// Spawn the worker. It exits once every `QueuedPublisher` is dropped and the
/// pending request (if any) has been served.
pub fn spawn<P>(publisher: P) -> (QueuedPublisher, JoinHandle<WorkerReport>)
where
    P: Publisher + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let handle = tokio::spawn(run_worker(publisher, rx));
    (QueuedPublisher { tx }, handle)
}

async fn run_worker<P>(mut publisher: P, mut rx: mpsc::Receiver<()>) -> WorkerReport
where
    P: Publisher + Send + 'static,
{
    let mut report = WorkerReport::default();
    while rx.recv().await.is_some() {
        let attempted_at = Utc::now();
        let outcome = tokio::task::spawn_blocking(move || {
            let result = publisher.publish();
            (publisher, result)
        })
        .await;

        let result = match outcome {
            Ok((returned, result)) => {
                publisher = returned;
                result
            }
            Err(e) => {
                tracing::error!("publish task panicked, publishing disabled: {e}");
                return report;
            }
        };

        match result {
            Ok(()) => report.published += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    attempted_at = %attempted_at.format("%a-%d-%b_%H-%M-%S"),
                    error = %e,
                    "publish failed, will retry at next event"
                );
            }
        }
    }
    tracing::debug!(
        published = report.published,
        failed = report.failed,
        "publish worker stopped"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Publisher for Counting {
        fn publish(&mut self) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PublishError::CommandFailed {
                    step: "push".to_string(),
                    detail: "remote hung up".to_string(),
                });
            }
            Ok(())
        }
    }

    /// Blocks inside `publish` until the test releases it.
    struct Gated {
        started: mpsc::UnboundedSender<()>,
        gate: std::sync::mpsc::Receiver<()>,
        calls: Arc<AtomicUsize>,
    }

    impl Publisher for Gated {
        fn publish(&mut self) -> Result<(), PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.started.send(());
            let _ = self.gate.recv();
            Ok(())
        }
    }

    #[tokio::test]
    async fn publishes_then_stops_when_sender_dropped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut queue, handle) = spawn(Counting {
            calls: Arc::clone(&calls),
            fail: false,
        });
        queue.publish().expect("enqueue");
        drop(queue);

        let report = handle.await.expect("join");
        assert_eq!(report.published, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pending_requests_coalesce() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (started_tx, mut started_rx) = mpsc::unbounded_channel();
        let (gate_tx, gate_rx) = std::sync::mpsc::channel();
        let (mut queue, handle) = spawn(Gated {
            started: started_tx,
            gate: gate_rx,
            calls: Arc::clone(&calls),
        });

        queue.publish().expect("enqueue");
        started_rx.recv().await.expect("first publish started");

        // One slot is free while the first publish runs; the rest fold into it.
        for _ in 0..4 {
            queue.publish().expect("enqueue");
        }
        drop(queue);
        gate_tx.send(()).expect("release first");
        gate_tx.send(()).expect("release second");

        let report = handle.await.expect("join");
        assert_eq!(report.published, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_counted_and_worker_keeps_going() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (mut queue, handle) = spawn(Counting {
            calls: Arc::clone(&calls),
            fail: true,
        });
        queue.publish().expect("enqueue");
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        queue.publish().expect("enqueue after failure");
        drop(queue);

        let report = handle.await.expect("join");
        assert_eq!(report.published, 0);
        assert_eq!(report.failed, 2);
    }

    #[tokio::test]
    async fn enqueue_after_worker_gone_reports_stopped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut queue = QueuedPublisher { tx };
        assert!(matches!(queue.publish(), Err(PublishError::WorkerStopped)));
    }
}

//! Time sources and sleep points used by the monitor loop.
//! Both are traits so the state machine can be driven by a fake clock in tests.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Returned by a [`Sleeper`] when the host asked the loop to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("monitor cancelled")]
pub struct Cancelled;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Blocking wait between probes. Returning `Err(Cancelled)` ends the monitor.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration) -> Result<(), Cancelled>;
}

impl<T: Sleeper + ?Sized> Sleeper for &mut T {
    fn sleep(&mut self, duration: Duration) -> Result<(), Cancelled> {
        (**self).sleep(duration)
    }
}

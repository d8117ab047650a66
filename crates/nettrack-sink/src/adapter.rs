//! EventSink that appends to an [`EventLog`] and then publishes.

use chrono::Utc;
use nettrack_core::{EventRecord, EventSink};

use crate::csv_log::EventLog;
use crate::publish::Publisher;

/// Counters for what the adapter has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub appended: u64,
    pub append_failures: u64,
    /// Publish calls that returned `Ok`. A queued or disabled publisher
    /// returns `Ok` without pushing anything, so this is not a push count.
    pub publish_requests: u64,
    pub publish_failures: u64,
}

pub struct SinkAdapter<L, P> {
    log: L,
    publisher: P,
    stats: SinkStats,
}

impl<L: EventLog, P: Publisher> SinkAdapter<L, P> {
    pub fn new(log: L, publisher: P) -> Self {
        Self {
            log,
            publisher,
            stats: SinkStats::default(),
        }
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    pub fn log(&self) -> &L {
        &self.log
    }
}

impl<L: EventLog, P: Publisher> EventSink for SinkAdapter<L, P> {
    fn on_event(&mut self, record: &EventRecord) {
        if let Err(e) = self.log.append(record) {
            self.stats.append_failures += 1;
            tracing::error!(kind = %record.kind, "event log append failed, record dropped: {e}");
            return;
        }
        self.stats.appended += 1;

        let attempted_at = Utc::now();
        match self.publisher.publish() {
            Ok(()) => self.stats.publish_requests += 1,
            Err(e) => {
                self.stats.publish_failures += 1;
                tracing::warn!(
                    attempted_at = %attempted_at.format("%a-%d-%b_%H-%M-%S"),
                    error = %e,
                    "publish failed, will retry at next event"
                );
            }
        }
    }
}

//! Event consumer seam.

use crate::types::EventRecord;

/// Receives every emitted record, synchronously and in emission order.
///
/// Implementations must not fail the caller: storage and publish errors are
/// handled (logged) inside `on_event`.
pub trait EventSink {
    fn on_event(&mut self, record: &EventRecord);
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn on_event(&mut self, record: &EventRecord) {
        (**self).on_event(record)
    }
}

/// Collects records in memory.
impl EventSink for Vec<EventRecord> {
    fn on_event(&mut self, record: &EventRecord) {
        self.push(record.clone());
    }
}

//! Rebuild presence history from an event stream.

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::EventRecord;

/// Sequence of `connected` values implied by each record, in order.
pub fn connection_history<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> Vec<bool> {
    records.into_iter().map(|r| r.kind.is_connected()).collect()
}

/// A span of constant presence. `until` is `None` for the open period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub connected: bool,
    pub since: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
}

impl Period {
    pub fn duration(&self) -> Option<TimeDelta> {
        self.until.map(|until| until.signed_duration_since(self.since))
    }
}

/// Collapse records into presence periods bounded by their event times.
/// Consecutive records with the same presence extend the current period.
pub fn periods<'a>(records: impl IntoIterator<Item = &'a EventRecord>) -> Vec<Period> {
    let mut out: Vec<Period> = Vec::new();
    for record in records {
        let connected = record.kind.is_connected();
        if let Some(last) = out.last_mut() {
            if last.connected == connected {
                continue;
            }
            last.until = Some(record.event_at);
        }
        out.push(Period {
            connected,
            since: record.event_at,
            until: None,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
            .expect("valid RFC3339")
            .with_timezone(&Utc)
            + TimeDelta::seconds(secs)
    }

    fn record(kind: EventKind, at: i64) -> EventRecord {
        EventRecord {
            emitted_at: t(at),
            kind,
            event_at: t(at),
            dwell_prior: None,
        }
    }

    #[test]
    fn history_follows_kinds() {
        let records = [
            record(EventKind::CurrentlyDisconnected, 0),
            record(EventKind::Reconnected, 120),
            record(EventKind::Disconnected, 600),
        ];
        assert_eq!(connection_history(&records), vec![false, true, false]);
    }

    #[test]
    fn periods_close_on_transition() {
        let records = [
            record(EventKind::CurrentlyConnected, 0),
            record(EventKind::Disconnected, 300),
            record(EventKind::Reconnected, 500),
        ];
        let periods = periods(&records);
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].duration(), Some(TimeDelta::seconds(300)));
        assert_eq!(periods[1].duration(), Some(TimeDelta::seconds(200)));
        assert!(periods[2].connected);
        assert_eq!(periods[2].until, None);
    }

    #[test]
    fn periods_merge_repeated_presence() {
        // two disconnects with an absorbed reconnect in between
        let records = [
            record(EventKind::CurrentlyConnected, 0),
            record(EventKind::Disconnected, 100),
            record(EventKind::Disconnected, 160),
        ];
        let periods = periods(&records);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].since, t(100));
    }

    #[test]
    fn empty_stream() {
        let none: [EventRecord; 0] = [];
        assert!(connection_history(&none).is_empty());
        assert!(periods(&none).is_empty());
    }
}

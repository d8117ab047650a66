use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Event kind ───────────────────────────────────────────────────

/// Classification of a connectivity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Device came back after a disconnect longer than the reconnect threshold.
    Reconnected,
    /// Disconnect confirmed after the full confirmation window.
    Disconnected,
    /// Device is present and there is no significant prior disconnect.
    CurrentlyConnected,
    /// Device is absent on the first observation of the session.
    CurrentlyDisconnected,
}

impl EventKind {
    pub const ALL: [Self; 4] = [
        Self::Reconnected,
        Self::Disconnected,
        Self::CurrentlyConnected,
        Self::CurrentlyDisconnected,
    ];

    /// Label written to the event log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reconnected => "Reconnected",
            Self::Disconnected => "Disconnected",
            Self::CurrentlyConnected => "Currently connected",
            Self::CurrentlyDisconnected => "Currently disconnected",
        }
    }

    /// Presence implied by this event.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Reconnected | Self::CurrentlyConnected)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind: {0:?}")]
pub struct UnknownEventKind(pub String);

// ─── Connection state ─────────────────────────────────────────────

/// Debounced presence state carried between polls.
///
/// After the first observation exactly one of `connect_since` and
/// `disconnect_since` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    pub connect_since: Option<DateTime<Utc>>,
    pub disconnect_since: Option<DateTime<Utc>>,
    /// False until the first probe result has been folded in.
    pub observed: bool,
}

impl ConnectionState {
    /// Initial unknown state.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn mark_connected(&mut self, at: DateTime<Utc>) {
        self.connected = true;
        self.connect_since = Some(at);
        self.disconnect_since = None;
        self.observed = true;
    }

    pub fn mark_disconnected(&mut self, at: DateTime<Utc>) {
        self.connected = false;
        self.connect_since = None;
        self.disconnect_since = Some(at);
        self.observed = true;
    }
}

// ─── Event record ─────────────────────────────────────────────────

/// One entry of the append-only event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub emitted_at: DateTime<Utc>,
    pub kind: EventKind,
    pub event_at: DateTime<Utc>,
    #[serde(with = "dwell_secs")]
    pub dwell_prior: Option<TimeDelta>,
}

impl EventRecord {
    /// Time spent disconnected before this event, for connect-direction events.
    pub fn dwell_disconnected(&self) -> Option<TimeDelta> {
        self.dwell_prior.filter(|_| self.kind.is_connected())
    }

    /// Time spent connected before this event, for disconnect-direction events.
    pub fn dwell_connected(&self) -> Option<TimeDelta> {
        self.dwell_prior.filter(|_| !self.kind.is_connected())
    }
}

/// Elapsed time from `since` to `until`. Zero and negative spans count as
/// "no prior state".
pub fn dwell_between(since: Option<DateTime<Utc>>, until: DateTime<Utc>) -> Option<TimeDelta> {
    let since = since?;
    let delta = until.signed_duration_since(since);
    (delta > TimeDelta::zero()).then_some(delta)
}

// ─── Dwell formatting ─────────────────────────────────────────────

/// Render a dwell as `H:MM:SS`. Hours are not wrapped at 24.
pub fn format_dwell(dwell: TimeDelta) -> String {
    let total = dwell.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Parse the `H:MM:SS` form written by [`format_dwell`].
pub fn parse_dwell(s: &str) -> Option<TimeDelta> {
    let mut parts = s.trim().split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 || hours < 0 {
        return None;
    }
    TimeDelta::try_seconds(hours * 3600 + minutes * 60 + seconds)
}

/// Serde adapter storing an optional dwell as whole seconds.
mod dwell_secs {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.num_seconds()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        Ok(Option::<i64>::deserialize(d)?.and_then(TimeDelta::try_seconds))
    }
}

// ─── Tests ────────────────────────────────────────────────────────

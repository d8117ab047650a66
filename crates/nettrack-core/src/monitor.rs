//! Debounced presence monitor.
//!
//! One cycle probes the device, folds the result into [`ConnectionState`],
//! and optionally yields an [`EventRecord`]:
//!
//! - **Connect**: emitted on the first observation, or when the prior
//!   disconnect lasted longer than `reconnect_threshold`. Shorter flaps are
//!   absorbed silently.
//! - **Disconnect**: an absent probe while connected opens a confirmation
//!   window of `confirm_attempts` probes spaced by `confirm_interval`. Any
//!   present probe inside the window is a false alarm. A confirmed disconnect
//!   is always emitted, dated at the first absent probe.
//! - **Steady state**: repeated present/absent probes in the current state are
//!   silent.
//!
//! The monitor is an [`Iterator`] that never ends on its own; it stops when
//! the [`Sleeper`] reports cancellation.

use std::iter::FusedIterator;

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::{Cancelled, Clock, Sleeper};
use crate::config::{ConfigError, DebounceConfig};
use crate::probe::Probe;
use crate::sink::EventSink;
use crate::types::{ConnectionState, EventKind, EventRecord, dwell_between};

pub struct Monitor<P, C, S> {
    device: String,
    config: DebounceConfig,
    probe: P,
    clock: C,
    sleeper: S,
    state: ConnectionState,
    /// Set after each cycle so the poll sleep runs before the next probe.
    sleep_due: bool,
    finished: bool,
}

impl<P: Probe, C: Clock, S: Sleeper> Monitor<P, C, S> {
    pub fn new(
        device: impl Into<String>,
        config: DebounceConfig,
        probe: P,
        clock: C,
        sleeper: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            device: device.into(),
            config,
            probe,
            clock,
            sleeper,
            state: ConnectionState::unknown(),
            sleep_due: false,
            finished: false,
        })
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Run one probe cycle, without the trailing poll sleep.
    ///
    /// `Err(Cancelled)` is only possible inside a disconnect confirmation
    /// window; the state is left untouched in that case.
    pub fn poll_once(&mut self) -> Result<Option<EventRecord>, Cancelled> {
        let present = self.is_present();
        let now = self.clock.now();

        match (present, self.state.connected) {
            (true, false) => Ok(self.on_present(now)),
            (true, true) => Ok(None),
            (false, true) => self.confirm_disconnect(now),
            (false, false) => Ok(self.on_absent(now)),
        }
    }

    /// Feed every emitted record into `sink` until cancelled.
    /// Returns the number of records delivered.
    pub fn run_into<K: EventSink>(self, sink: &mut K) -> usize {
        let mut delivered = 0;
        for record in self {
            sink.on_event(&record);
            delivered += 1;
        }
        delivered
    }

    fn is_present(&mut self) -> bool {
        match self.probe.probe(&self.device) {
            Ok(present) => present,
            Err(e) => {
                tracing::warn!(device = %self.device, "probe failed, counting as absent: {e}");
                false
            }
        }
    }

    fn on_present(&mut self, now: DateTime<Utc>) -> Option<EventRecord> {
        let first = !self.state.observed;
        let dwell = dwell_between(self.state.disconnect_since, now);
        self.state.mark_connected(now);

        let significant = dwell.is_some_and(|d| d > self.config.reconnect_threshold_delta());
        let kind = if significant {
            EventKind::Reconnected
        } else {
            EventKind::CurrentlyConnected
        };

        if first || dwell.is_none() || significant {
            Some(self.emit(kind, now, dwell))
        } else {
            tracing::debug!(
                device = %self.device,
                dwell_secs = dwell.map_or(0, |d| d.num_seconds()),
                "short disconnect absorbed"
            );
            None
        }
    }

    fn on_absent(&mut self, now: DateTime<Utc>) -> Option<EventRecord> {
        if self.state.observed {
            return None;
        }
        self.state.mark_disconnected(now);
        Some(self.emit(EventKind::CurrentlyDisconnected, now, None))
    }

    fn confirm_disconnect(
        &mut self,
        possible_at: DateTime<Utc>,
    ) -> Result<Option<EventRecord>, Cancelled> {
        for attempt in 1..self.config.confirm_attempts {
            self.sleeper.sleep(self.config.confirm_interval)?;
            if self.is_present() {
                tracing::debug!(device = %self.device, attempt, "false alarm, device still present");
                return Ok(None);
            }
        }

        let dwell = dwell_between(self.state.connect_since, possible_at);
        self.state.mark_disconnected(possible_at);
        Ok(Some(self.emit(EventKind::Disconnected, possible_at, dwell)))
    }

    fn emit(
        &self,
        kind: EventKind,
        event_at: DateTime<Utc>,
        dwell_prior: Option<TimeDelta>,
    ) -> EventRecord {
        tracing::info!(
            device = %self.device,
            kind = %kind,
            event_at = %event_at,
            dwell_secs = dwell_prior.map(|d| d.num_seconds()),
            "presence event"
        );
        EventRecord {
            emitted_at: self.clock.now(),
            kind,
            event_at,
            dwell_prior,
        }
    }
}

impl<P: Probe, C: Clock, S: Sleeper> Iterator for Monitor<P, C, S> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        if self.finished {
            return None;
        }
        loop {
            if self.sleep_due && self.sleeper.sleep(self.config.poll_interval).is_err() {
                break;
            }
            self.sleep_due = true;
            match self.poll_once() {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(Cancelled) => break,
            }
        }
        tracing::info!(device = %self.device, "monitor stopped");
        self.finished = true;
        None
    }
}

impl<P: Probe, C: Clock, S: Sleeper> FusedIterator for Monitor<P, C, S> {}

//! Deterministic stand-ins for the probe, clock and sleeper.
//!
//! A [`Simulation`] replays a fixed script of probe results against a manual
//! clock. Every sleep advances the clock by exactly the requested duration, so
//! event timestamps are reproducible. Once the script is used up, the next
//! sleep reports [`Cancelled`] and the monitor stops.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::clock::{Cancelled, Clock, Sleeper};
use crate::probe::Probe;

type Script = Rc<RefCell<VecDeque<Result<bool, String>>>>;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        self.now.set(self.now.get() + delta);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Probe answering from a fixed script.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    script: Script,
    calls: Rc<Cell<usize>>,
}

impl ScriptedProbe {
    pub fn new(results: impl IntoIterator<Item = bool>) -> Self {
        Self::from_results(results.into_iter().map(Ok))
    }

    pub fn from_results(results: impl IntoIterator<Item = Result<bool, String>>) -> Self {
        Self {
            script: Rc::new(RefCell::new(results.into_iter().collect())),
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Shared counter of probe invocations.
    pub fn call_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Probe for ScriptedProbe {
    type Error = String;

    fn probe(&mut self, _device: &str) -> Result<bool, String> {
        self.calls.set(self.calls.get() + 1);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err("probe script exhausted".to_string()))
    }
}

/// Sleeper that advances a [`ManualClock`] and cancels once the probe
/// script is empty.
#[derive(Debug)]
pub struct SimSleeper {
    clock: ManualClock,
    script: Script,
    history: Rc<RefCell<Vec<Duration>>>,
}

impl SimSleeper {
    /// Every requested sleep, including the one that cancelled.
    pub fn history(&self) -> Rc<RefCell<Vec<Duration>>> {
        Rc::clone(&self.history)
    }
}

impl Sleeper for SimSleeper {
    fn sleep(&mut self, duration: Duration) -> Result<(), Cancelled> {
        self.history.borrow_mut().push(duration);
        if self.script.borrow().is_empty() {
            return Err(Cancelled);
        }
        self.clock.advance(duration);
        Ok(())
    }
}

/// Probe, clock and sleeper wired to the same script.
pub struct Simulation {
    pub probe: ScriptedProbe,
    pub clock: ManualClock,
    pub sleeper: SimSleeper,
}

impl Simulation {
    pub fn new(start: DateTime<Utc>, script: impl IntoIterator<Item = bool>) -> Self {
        Self::with_probe(start, ScriptedProbe::new(script))
    }

    pub fn with_probe(start: DateTime<Utc>, probe: ScriptedProbe) -> Self {
        let clock = ManualClock::new(start);
        let sleeper = SimSleeper {
            clock: clock.clone(),
            script: Rc::clone(&probe.script),
            history: Rc::new(RefCell::new(Vec::new())),
        };
        Self {
            probe,
            clock,
            sleeper,
        }
    }
}

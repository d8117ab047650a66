//! nettrack-core: debounced presence detection for a single network device.
//! Pure state machine and the seams it is driven through (probe, clock,
//! sleeper, event sink). No IO lives here.

pub mod clock;
pub mod config;
pub mod history;
pub mod monitor;
pub mod probe;
pub mod sim;
pub mod sink;
pub mod types;

pub use clock::{Cancelled, Clock, Sleeper, SystemClock};
pub use config::{ConfigError, DebounceConfig};
pub use monitor::Monitor;
pub use probe::Probe;
pub use sink::EventSink;
pub use types::{ConnectionState, EventKind, EventRecord};

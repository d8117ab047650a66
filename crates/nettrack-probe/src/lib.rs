//! nettrack-probe: nmap reachability probe.
//! Runs a ping scan over the local subnet and looks the device up in the
//! report. Pure IO boundary; all decisions happen in nettrack-core.

pub mod error;
pub mod executor;
pub mod nmap;
pub mod report;

pub use error::ProbeError;
pub use executor::{NmapExecutor, ScanRunner};
pub use nmap::{DEFAULT_SUBNET, NmapProbe};
pub use report::{ScanHost, parse_scan_report};

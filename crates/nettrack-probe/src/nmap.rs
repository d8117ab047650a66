//! `Probe` implementation backed by an nmap ping scan of the local subnet.

use nettrack_core::Probe;

use crate::error::ProbeError;
use crate::executor::{NmapExecutor, ScanRunner};
use crate::report::parse_scan_report;

pub const DEFAULT_SUBNET: &str = "192.168.0.0/24";

pub struct NmapProbe<R = NmapExecutor> {
    runner: R,
    subnet: String,
}

impl<R: ScanRunner> NmapProbe<R> {
    pub fn new(runner: R, subnet: impl Into<String>) -> Self {
        Self {
            runner,
            subnet: subnet.into(),
        }
    }

    /// Run one ping scan and report whether `device` is among the live hosts.
    pub fn scan(&self, device: &str) -> Result<bool, ProbeError> {
        let output = self.runner.run(&["-sn", &self.subnet])?;
        let hosts = parse_scan_report(&output);
        let found = hosts.iter().any(|host| host.matches(device));
        tracing::debug!(
            device,
            subnet = %self.subnet,
            hosts_up = hosts.len(),
            found,
            "scan complete"
        );
        Ok(found)
    }
}

impl<R: ScanRunner> Probe for NmapProbe<R> {
    type Error = ProbeError;

    fn probe(&mut self, device: &str) -> Result<bool, ProbeError> {
        self.scan(device)
    }
}

//! Reachability probe seam.

use std::fmt::Display;

/// One active reachability check for a device identifier.
///
/// Errors are not fatal to the monitor: a failed probe counts as "absent".
pub trait Probe {
    type Error: Display;

    fn probe(&mut self, device: &str) -> Result<bool, Self::Error>;
}

impl<T: Probe + ?Sized> Probe for &mut T {
    type Error = T::Error;

    fn probe(&mut self, device: &str) -> Result<bool, Self::Error> {
        (**self).probe(device)
    }
}

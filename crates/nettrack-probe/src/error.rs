//! Error types for the nmap probe.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("nmap command failed: {0}")]
    CommandFailed(String),

    #[error("nmap io error: {0}")]
    Io(#[from] std::io::Error),
}

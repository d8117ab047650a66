//! Error types for the event log and the publisher.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse event log line {line_num}: {detail}")]
    Parse { line_num: usize, detail: String },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("git {step} failed: {detail}")]
    CommandFailed { step: String, detail: String },

    #[error("git io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("publish worker stopped")]
    WorkerStopped,
}

//! nettrack-sink: durable event log and remote publishing.
//! Appends each presence event to a CSV file, then pushes the file to a git
//! remote. Publish failures are logged and retried on the next event.

pub mod adapter;
pub mod csv_log;
pub mod error;
pub mod publish;

pub use adapter::{SinkAdapter, SinkStats};
pub use csv_log::{CsvEventLog, EventLog, HEADER, log_file_name};
pub use error::{PublishError, SinkError};
pub use publish::{GitExecutor, GitPublisher, GitRunner, Publisher};

//! Append-only CSV event log.
//!
//! One header line, then one line per event:
//! `timestamp,event,event_ts,time_spent_disconnected,time_spent_connected`.
//! Only one of the two dwell columns is filled, depending on the direction of
//! the transition.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use nettrack_core::types::{format_dwell, parse_dwell};
use nettrack_core::{EventKind, EventRecord};

use crate::error::SinkError;

pub const HEADER: &str =
    "timestamp,event,event_ts,time_spent_disconnected,time_spent_connected";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILE_NAME_FORMAT: &str = "_%d-%b-%a_%H-%M-%S";

/// Durable destination for event records.
pub trait EventLog {
    fn append(&mut self, record: &EventRecord) -> Result<(), SinkError>;
}

impl<T: EventLog + ?Sized> EventLog for &mut T {
    fn append(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        (**self).append(record)
    }
}

/// `<alias>_<day>-<mon>-<weekday>_<H>-<M>-<S>.csv`, stamped with the session start.
pub fn log_file_name(alias: &str, started: NaiveDateTime) -> String {
    format!("{alias}{}.csv", started.format(FILE_NAME_FORMAT))
}

pub struct CsvEventLog {
    writer: File,
}

impl CsvEventLog {
    /// Create (or truncate) the log and write the header.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let mut writer = File::create(path)?;
        writeln!(writer, "{HEADER}")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Read back every record of a log written by this type.
    pub fn read_records(path: &Path) -> Result<Vec<EventRecord>, SinkError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if idx == 0 || trimmed.is_empty() {
                continue;
            }
            records.push(parse_line(trimmed, idx + 1)?);
        }
        Ok(records)
    }
}

impl EventLog for CsvEventLog {
    fn append(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        writeln!(self.writer, "{}", format_line(record))?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn format_line(record: &EventRecord) -> String {
    let dwell = |d: Option<chrono::TimeDelta>| d.map(format_dwell).unwrap_or_default();
    format!(
        "{},{},{},{},{}",
        record.emitted_at.format(TIMESTAMP_FORMAT),
        record.kind,
        record.event_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        dwell(record.dwell_disconnected()),
        dwell(record.dwell_connected()),
    )
}

pub fn parse_line(line: &str, line_num: usize) -> Result<EventRecord, SinkError> {
    let parse_err = |detail: String| SinkError::Parse { line_num, detail };

    let mut fields: Vec<&str> = line.split(',').map(str::trim).collect();
    // Tolerate a trailing delimiter.
    if fields.len() == 6 && fields[5].is_empty() {
        fields.pop();
    }
    if fields.len() != 5 {
        return Err(parse_err(format!(
            "expected 5 comma-separated fields, got {}",
            fields.len()
        )));
    }

    let emitted_at = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT)
        .map_err(|e| parse_err(format!("timestamp {:?}: {e}", fields[0])))?
        .and_utc();
    let kind: EventKind = fields[1].parse().map_err(|e| parse_err(format!("{e}")))?;
    let event_at = DateTime::parse_from_rfc3339(fields[2])
        .map_err(|e| parse_err(format!("event_ts {:?}: {e}", fields[2])))?
        .with_timezone(&Utc);

    let dwell_field = |s: &str| -> Result<Option<chrono::TimeDelta>, SinkError> {
        if s.is_empty() {
            return Ok(None);
        }
        parse_dwell(s)
            .map(Some)
            .ok_or_else(|| parse_err(format!("dwell {s:?}")))
    };
    let dwell_disconnected = dwell_field(fields[3])?;
    let dwell_connected = dwell_field(fields[4])?;

    Ok(EventRecord {
        emitted_at,
        kind,
        event_at,
        dwell_prior: dwell_disconnected.or(dwell_connected),
    })
}

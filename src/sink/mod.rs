// Output sinks for formatted log records

mod file;

pub use file::{FileSink, DEFAULT_MAX_LOG_SIZE, LOG_RETENTION_DAYS};

use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::level::Level;

/// Errors a sink can raise during setup
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to create log directory {0}: {1}")]
    PathCreate(PathBuf, std::io::Error),
}

/// Destination for already-formatted log records.
///
/// Workers call the write methods concurrently; implementations serialize
/// internally. A write failure must never propagate into the pipeline: a
/// sink reports to stderr and keeps going, and callers never retry.
pub trait Sink: Send + Sync {
    fn setup(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn teardown(&self) {}

    fn write_verbose(&self, msg: &[u8]);
    fn write_debug(&self, msg: &[u8]);
    fn write_info(&self, msg: &[u8]);
    fn write_warn(&self, msg: &[u8]);
    fn write_error(&self, msg: &[u8]);

    /// Fatal records are written synchronously; terminal sinks are
    /// expected to end the process once the record is durable.
    fn write_fatal(&self, msg: &[u8]);

    /// Dispatch a record to the write method matching its level.
    fn write(&self, level: Level, msg: &[u8]) {
        match level {
            Level::Verbose => self.write_verbose(msg),
            Level::Debug => self.write_debug(msg),
            Level::Info => self.write_info(msg),
            Level::Warn => self.write_warn(msg),
            Level::Error => self.write_error(msg),
            Level::Fatal => self.write_fatal(msg),
        }
    }
}

/// Standard output sink. No filtering happens here; deciding what to
/// emit is the producer's job.
pub struct StdoutSink {
    stdout: std::io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stdout: std::io::stdout(),
        }
    }

    fn put(&self, msg: &[u8]) {
        let mut out = self.stdout.lock();
        let _ = out.write_all(msg);
        let _ = out.write_all(b"\n");
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for StdoutSink {
    fn write_verbose(&self, msg: &[u8]) {
        self.put(msg);
    }

    fn write_debug(&self, msg: &[u8]) {
        self.put(msg);
    }

    fn write_info(&self, msg: &[u8]) {
        self.put(msg);
    }

    fn write_warn(&self, msg: &[u8]) {
        self.put(msg);
    }

    fn write_error(&self, msg: &[u8]) {
        self.put(msg);
    }

    fn write_fatal(&self, msg: &[u8]) {
        self.put(msg);
        let _ = self.stdout.lock().flush();
    }
}

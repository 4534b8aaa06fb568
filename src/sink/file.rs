// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Level-partitioned rolling file sink.
//!
//! One active file per severity tier (info, warn, error, fatal). A record
//! lands in its own tier and fans down into every enabled tier below it,
//! so the info file carries the complete stream while the error file holds
//! only errors and fatals. Files rotate on a size cap and expire after a
//! retention window.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{Sink, SinkError};
use crate::config::LogConfig;
use crate::level::Level;

/// Size cap on one active tier file before rotation (1 GiB).
pub const DEFAULT_MAX_LOG_SIZE: u64 = 1024 * 1024 * 1024;

/// Files older than this many days are removed by the cleanup pass.
pub const LOG_RETENTION_DAYS: u64 = 14;

const TIER_COUNT: usize = 4;
const TIER_NAMES: [&str; TIER_COUNT] = ["info", "warn", "error", "fatal"];

/// Tier index for a level. Verbose and Debug fold into the info tier,
/// the most verbose file kept.
fn tier_of(level: Level) -> usize {
    match level {
        Level::Verbose | Level::Debug | Level::Info => 0,
        Level::Warn => 1,
        Level::Error => 2,
        Level::Fatal => 3,
    }
}

struct TierFile {
    file: File,
    written: u64,
}

pub struct FileSink {
    prefix: String,
    dir: PathBuf,
    stderr_threshold: Level,
    file_threshold: Option<Level>,
    mirror_console: bool,
    max_log_size: u64,
    retention: Duration,
    /// Distinguishes files opened within the same second.
    open_seq: AtomicU32,
    tiers: Mutex<[Option<TierFile>; TIER_COUNT]>,
}

impl FileSink {
    pub fn new(
        app_id: &str,
        dir: &Path,
        stderr_threshold: Level,
        file_threshold: Option<Level>,
        mirror_console: bool,
    ) -> Self {
        let prefix = if app_id.is_empty() {
            "log".to_string()
        } else {
            app_id.to_string()
        };

        Self {
            prefix,
            dir: dir.to_path_buf(),
            stderr_threshold,
            file_threshold,
            mirror_console,
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            retention: Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60),
            open_seq: AtomicU32::new(0),
            tiers: Mutex::new([None, None, None, None]),
        }
    }

    pub fn from_config(config: &LogConfig) -> Self {
        let file_threshold = if config.log_to_file {
            config.file_threshold
        } else {
            None
        };

        Self::new(
            &config.app_id,
            &config.file_path,
            config.stderr_threshold,
            file_threshold,
            config.log_to_console,
        )
    }

    pub fn with_max_log_size(mut self, max_log_size: u64) -> Self {
        self.max_log_size = max_log_size;
        self
    }

    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention = Duration::from_secs(days * 24 * 60 * 60);
        self
    }

    fn open_tier(&self, tier: usize) -> Option<TierFile> {
        let seq = self.open_seq.fetch_add(1, Ordering::Relaxed);
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let path = self
            .dir
            .join(format!("{}.{}.{}.{}.log", self.prefix, TIER_NAMES[tier], stamp, seq));

        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                let written = file.metadata().map(|m| m.len()).unwrap_or(0);
                Some(TierFile { file, written })
            }
            Err(e) => {
                eprintln!("failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Append one line to a tier, rotating first if the cap would be hit.
    fn append(&self, tiers: &mut [Option<TierFile>; TIER_COUNT], tier: usize, msg: &[u8]) {
        let line_len = msg.len() as u64 + 1;

        let full = tiers[tier]
            .as_ref()
            .is_some_and(|tf| tf.written + line_len > self.max_log_size);
        if full {
            tiers[tier] = None;
            self.cleanup_expired();
        }

        if tiers[tier].is_none() {
            tiers[tier] = self.open_tier(tier);
        }

        if let Some(tf) = &mut tiers[tier] {
            let result = tf
                .file
                .write_all(msg)
                .and_then(|_| tf.file.write_all(b"\n"))
                .and_then(|_| tf.file.flush());
            match result {
                Ok(()) => tf.written += line_len,
                Err(e) => eprintln!("log file write failed: {}", e),
            }
        }
    }

    fn write_record(&self, level: Level, msg: &[u8]) {
        // Fatal records always reach the terminal, mirrored or not.
        if level == Level::Fatal || (self.mirror_console && level >= self.stderr_threshold) {
            let mut err = std::io::stderr().lock();
            let _ = err.write_all(msg);
            let _ = err.write_all(b"\n");
        }

        let Some(threshold) = self.file_threshold else {
            return;
        };
        if level < threshold {
            return;
        }

        let floor = tier_of(threshold);
        let top = tier_of(level);
        let mut tiers = self.tiers.lock().unwrap();
        for tier in floor..=top {
            self.append(&mut tiers, tier, msg);
        }
    }

    /// Remove this sink's files whose age exceeds the retention window.
    fn cleanup_expired(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };

        let marker = format!("{}.", self.prefix);
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&marker) || !name.ends_with(".log") {
                continue;
            }

            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.elapsed().ok())
                .map(|age| age > self.retention)
                .unwrap_or(false);

            if expired {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

impl Sink for FileSink {
    fn setup(&self) -> Result<(), SinkError> {
        if self.file_threshold.is_some() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| SinkError::PathCreate(self.dir.clone(), e))?;
            self.cleanup_expired();
        }
        Ok(())
    }

    fn teardown(&self) {
        let mut tiers = self.tiers.lock().unwrap();
        for tier in tiers.iter_mut() {
            if let Some(tf) = tier {
                let _ = tf.file.flush();
            }
            *tier = None;
        }
    }

    fn write_verbose(&self, msg: &[u8]) {
        self.write_record(Level::Verbose, msg);
    }

    fn write_debug(&self, msg: &[u8]) {
        self.write_record(Level::Debug, msg);
    }

    fn write_info(&self, msg: &[u8]) {
        self.write_record(Level::Info, msg);
    }

    fn write_warn(&self, msg: &[u8]) {
        self.write_record(Level::Warn, msg);
    }

    fn write_error(&self, msg: &[u8]) {
        self.write_record(Level::Error, msg);
    }

    fn write_fatal(&self, msg: &[u8]) {
        self.write_record(Level::Fatal, msg);

        {
            let mut tiers = self.tiers.lock().unwrap();
            for tier in tiers.iter_mut().flatten() {
                let _ = tier.file.flush();
            }
        }

        std::process::abort();
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logger configuration: the argv surface, validation and normalization.
//!
//! The configuration is immutable once the manager has run setup. Invalid
//! combinations are rejected outright; out-of-range pipeline tuning is
//! clamped upward with a warning on stderr.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::level::{Level, SinkKind};

/// Records drained per worker wakeup.
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Smallest batch worth waking a worker for.
pub const MIN_BATCH_SIZE: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
pub const DEFAULT_NUM_WORKERS: usize = 2;
pub const DEFAULT_POOL_SIZE: usize = 10_000;

/// Configuration combinations that cannot be normalized away
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sink type stdout cannot log to file (remove --file/--to-file/--file-path)")]
    StdoutWithFile,

    #[error("file sinks only support levels debug|info|warn|error|fatal, got verbose")]
    VerboseWithFileSink,

    #[error("set --file before enabling file mode options")]
    FileModeWithoutFileFlag,
}

/// File threshold vocabulary: a level, or `nolog` to disable file output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FileThreshold {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Nolog,
}

impl FileThreshold {
    pub fn to_level(self) -> Option<Level> {
        match self {
            FileThreshold::Verbose => Some(Level::Verbose),
            FileThreshold::Debug => Some(Level::Debug),
            FileThreshold::Info => Some(Level::Info),
            FileThreshold::Warn => Some(Level::Warn),
            FileThreshold::Error => Some(Level::Error),
            FileThreshold::Fatal => Some(Level::Fatal),
            FileThreshold::Nolog => None,
        }
    }
}

/// Parse `--file-path`, allowing the empty-string default (clap's builtin
/// `PathBuf` parser rejects empty values outright).
fn parse_file_path(s: &str) -> Result<PathBuf, std::convert::Infallible> {
    Ok(PathBuf::from(s))
}

/// Command line surface for the logging subsystem.
#[derive(Parser, Debug, PartialEq)]
#[command(author, version, about = "asynchronous logging pipeline", long_about = None)]
pub struct LogArgs {
    /// Application identifier passed to sink initialization
    #[arg(long, default_value = "")]
    pub app_id: String,

    /// Minimum level emitted to the terminal
    #[arg(long = "to-term", value_enum, default_value = "info")]
    pub to_term: Level,

    /// Minimum level emitted to file; `nolog` disables file emission
    #[arg(long = "to-file", value_enum, default_value = "nolog")]
    pub to_file: FileThreshold,

    /// Sink selection
    #[arg(long = "sinktype", value_enum, default_value = "stdout")]
    pub sinktype: SinkKind,

    /// Mirror file-sink records to the terminal
    #[arg(long)]
    pub console: bool,

    /// Enable file output
    #[arg(long)]
    pub file: bool,

    /// Directory for log files; defaults to ./logs under the working directory
    #[arg(long = "file-path", default_value = "", value_parser = parse_file_path)]
    pub file_path: PathBuf,

    /// Gate Debug-level records
    #[arg(long = "debug-switch")]
    pub debug_switch: bool,

    /// Records to process per batch (async sink)
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Maximum queue size before records are dropped (async sink)
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Number of worker threads (async sink)
    #[arg(long = "num-workers", default_value_t = DEFAULT_NUM_WORKERS)]
    pub num_workers: usize,

    /// Size of the record pool (async sink)
    #[arg(long = "pool-size", default_value_t = DEFAULT_POOL_SIZE)]
    pub pool_size: usize,
}

impl LogArgs {
    /// Lower the argv surface into the config the manager consumes.
    pub fn into_config(self) -> LogConfig {
        LogConfig {
            app_id: self.app_id,
            stderr_threshold: self.to_term,
            file_threshold: self.to_file.to_level(),
            sink_kind: self.sinktype,
            log_to_file: self.file,
            file_path: self.file_path,
            log_to_console: self.console,
            debug_enabled: self.debug_switch,
            tuning: TuningConfig {
                batch_size: self.batch_size,
                queue_capacity: self.queue_capacity,
                num_workers: self.num_workers,
                pool_size: self.pool_size,
            },
        }
    }
}

/// Tuning knobs for the async pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TuningConfig {
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub num_workers: usize,
    pub pool_size: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            num_workers: DEFAULT_NUM_WORKERS,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl TuningConfig {
    /// Clamp out-of-range values upward, warning on stderr.
    pub fn normalize(&mut self) {
        if self.batch_size < MIN_BATCH_SIZE {
            eprintln!(
                "Warning: batch_size too small, setting to minimum of {}",
                MIN_BATCH_SIZE
            );
            self.batch_size = MIN_BATCH_SIZE;
        }

        if self.queue_capacity < self.batch_size * 2 {
            eprintln!("Warning: queue_capacity too small, setting to 2x batch_size");
            self.queue_capacity = self.batch_size * 2;
        }

        if self.num_workers < 1 {
            eprintln!("Warning: num_workers must be at least 1");
            self.num_workers = 1;
        }

        if self.pool_size < self.queue_capacity {
            eprintln!("Warning: pool_size should be at least as large as queue_capacity");
            self.pool_size = self.queue_capacity;
        }
    }
}

/// Complete logger configuration, immutable after setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Identifier handed to sink initialization and file naming
    pub app_id: String,

    /// Minimum level emitted to the terminal
    pub stderr_threshold: Level,

    /// Minimum level emitted to file; `None` disables file emission
    pub file_threshold: Option<Level>,

    /// Which sink the manager builds
    pub sink_kind: SinkKind,

    /// Whether file output is enabled at all
    pub log_to_file: bool,

    /// Directory for log files
    pub file_path: PathBuf,

    /// Mirror file-sink records to the terminal
    pub log_to_console: bool,

    /// Gate Debug-level records
    pub debug_enabled: bool,

    /// Async pipeline tuning
    pub tuning: TuningConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            stderr_threshold: Level::Info,
            file_threshold: None,
            sink_kind: SinkKind::Stdout,
            log_to_file: false,
            file_path: PathBuf::new(),
            log_to_console: false,
            debug_enabled: false,
            tuning: TuningConfig::default(),
        }
    }
}

impl LogConfig {
    /// Reject contradictory options and normalize the rest.
    ///
    /// An empty file path with file output enabled falls back to `./logs`
    /// under the current working directory.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        match self.sink_kind {
            SinkKind::Stdout => {
                if self.log_to_file
                    || self.file_threshold.is_some()
                    || !self.file_path.as_os_str().is_empty()
                {
                    return Err(ConfigError::StdoutWithFile);
                }
            }
            SinkKind::File | SinkKind::AsyncFile => {
                if self.stderr_threshold == Level::Verbose
                    || self.file_threshold == Some(Level::Verbose)
                {
                    return Err(ConfigError::VerboseWithFileSink);
                }

                if !self.log_to_file
                    && (self.file_threshold.is_some() || !self.file_path.as_os_str().is_empty())
                {
                    return Err(ConfigError::FileModeWithoutFileFlag);
                }

                if self.log_to_file && self.file_path.as_os_str().is_empty() {
                    self.file_path = std::env::current_dir().unwrap_or_default().join("logs");
                }
            }
        }

        if self.sink_kind == SinkKind::AsyncFile {
            self.tuning.normalize();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> LogConfig {
        LogConfig {
            sink_kind: SinkKind::AsyncFile,
            log_to_file: true,
            file_path: PathBuf::from("/tmp/logs"),
            file_threshold: Some(Level::Info),
            ..LogConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let mut config = LogConfig::default();
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_stdout_rejects_file_options() {
        let mut config = LogConfig {
            log_to_file: true,
            ..LogConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StdoutWithFile));

        let mut config = LogConfig {
            file_threshold: Some(Level::Info),
            ..LogConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::StdoutWithFile));
    }

    #[test]
    fn test_file_sink_rejects_verbose() {
        let mut config = file_config();
        config.file_threshold = Some(Level::Verbose);
        assert_eq!(config.validate(), Err(ConfigError::VerboseWithFileSink));

        let mut config = file_config();
        config.stderr_threshold = Level::Verbose;
        assert_eq!(config.validate(), Err(ConfigError::VerboseWithFileSink));
    }

    #[test]
    fn test_file_options_require_file_flag() {
        let mut config = file_config();
        config.log_to_file = false;
        assert_eq!(config.validate(), Err(ConfigError::FileModeWithoutFileFlag));
    }

    #[test]
    fn test_empty_file_path_gets_default() {
        let mut config = file_config();
        config.file_path = PathBuf::new();
        config.validate().unwrap();
        assert!(config.file_path.ends_with("logs"));
    }

    #[test]
    fn test_tuning_clamps() {
        let mut tuning = TuningConfig {
            batch_size: 3,
            queue_capacity: 5,
            num_workers: 0,
            pool_size: 1,
        };
        tuning.normalize();
        assert_eq!(tuning.batch_size, MIN_BATCH_SIZE);
        assert_eq!(tuning.queue_capacity, 2 * MIN_BATCH_SIZE);
        assert_eq!(tuning.num_workers, 1);
        assert_eq!(tuning.pool_size, tuning.queue_capacity);
    }

    #[test]
    fn test_tuning_defaults_untouched() {
        let mut tuning = TuningConfig::default();
        tuning.normalize();
        assert_eq!(tuning, TuningConfig::default());
    }

    #[test]
    fn test_args_lowering() {
        let args = LogArgs::try_parse_from([
            "logger",
            "--app-id=relay",
            "--sinktype=async-file",
            "--to-term=warn",
            "--to-file=info",
            "--file",
            "--file-path=/var/log/relay",
            "--debug-switch",
            "--batch-size=50",
        ])
        .unwrap();

        let config = args.into_config();
        assert_eq!(config.app_id, "relay");
        assert_eq!(config.sink_kind, SinkKind::AsyncFile);
        assert_eq!(config.stderr_threshold, Level::Warn);
        assert_eq!(config.file_threshold, Some(Level::Info));
        assert!(config.log_to_file);
        assert!(config.debug_enabled);
        assert_eq!(config.tuning.batch_size, 50);
        assert_eq!(config.tuning.num_workers, DEFAULT_NUM_WORKERS);
    }

    #[test]
    fn test_args_nolog_file_threshold() {
        let args = LogArgs::try_parse_from(["logger"]).unwrap();
        let config = args.into_config();
        assert_eq!(config.file_threshold, None);
        assert_eq!(config.sink_kind, SinkKind::Stdout);
    }
}

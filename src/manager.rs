// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Process-wide logger lifecycle.
//!
//! The manager owns the configuration and the active sink and sequences
//! `setup` (validate, build the sink, start it), `setup_logger` (bind the
//! producer path) and `teardown` (detach producers, drain and close the
//! sink). Tearing down and setting up again is supported; the pipeline
//! counters start from zero on each setup.

use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;

use crate::config::{ConfigError, LogConfig};
use crate::front;
use crate::level::{Level, LevelMask, SinkKind};
use crate::pipeline::{AsyncSink, MetricsSnapshot};
use crate::sink::{FileSink, Sink, SinkError, StdoutSink};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("logger is running; teardown first")]
    AlreadyRunning,

    #[error("setup_logger called before setup")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Configured,
    Running,
    TornDown,
}

struct ManagerState {
    phase: Phase,
    config: LogConfig,
    sink: Option<Arc<dyn Sink>>,
    /// Typed handle kept alongside the sink when the async pipeline is up,
    /// so counters stay readable.
    pipeline: Option<Arc<AsyncSink>>,
}

pub struct LoggerManager {
    state: Mutex<ManagerState>,
}

impl LoggerManager {
    /// The process-wide manager. Producer macros route through the
    /// callback this instance installs.
    pub fn instance() -> &'static LoggerManager {
        static INSTANCE: OnceLock<LoggerManager> = OnceLock::new();
        INSTANCE.get_or_init(LoggerManager::new)
    }

    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManagerState {
                phase: Phase::Uninitialized,
                config: LogConfig::default(),
                sink: None,
                pipeline: None,
            }),
        }
    }

    /// Validate and adopt a configuration, build the selected sink and run
    /// its setup. Allowed from any phase except Running.
    pub fn setup(&self, mut config: LogConfig) -> Result<(), SetupError> {
        let mut state = self.state.lock().unwrap();
        if state.phase == Phase::Running {
            return Err(SetupError::AlreadyRunning);
        }

        config.validate()?;

        let (sink, pipeline) = build_sink(&config);
        sink.setup()?;

        state.config = config;
        state.sink = Some(sink);
        state.pipeline = pipeline;
        state.phase = Phase::Configured;
        Ok(())
    }

    /// Bind the producer path to the sink built by `setup`. Emits are live
    /// after this returns.
    pub fn setup_logger(&self) -> Result<(), SetupError> {
        let mut state = self.state.lock().unwrap();
        let sink = state.sink.clone().ok_or(SetupError::NotConfigured)?;

        let mask = effective_mask(&state.config);
        front::install(Arc::new(move |level, msg: &[u8]| sink.write(level, msg)), mask);

        state.phase = Phase::Running;
        Ok(())
    }

    /// Detach producers first so emits become no-ops, then drain and close
    /// the sink. Safe to call repeatedly.
    pub fn teardown(&self) {
        let mut state = self.state.lock().unwrap();

        front::clear();

        if let Some(sink) = state.sink.take() {
            sink.teardown();
        }
        state.pipeline = None;
        state.phase = Phase::TornDown;
    }

    /// Pipeline counters; `None` when the active sink has no pipeline.
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.state
            .lock()
            .unwrap()
            .pipeline
            .as_ref()
            .map(|p| p.metrics_snapshot())
    }

    pub fn config(&self) -> LogConfig {
        self.state.lock().unwrap().config.clone()
    }
}

impl Default for LoggerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the sink for the configured kind. The async kind wraps the file
/// sink with the pool, queue and worker threads.
fn build_sink(config: &LogConfig) -> (Arc<dyn Sink>, Option<Arc<AsyncSink>>) {
    match config.sink_kind {
        SinkKind::Stdout => (Arc::new(StdoutSink::new()), None),
        SinkKind::File => (Arc::new(FileSink::from_config(config)), None),
        SinkKind::AsyncFile => {
            let inner: Arc<dyn Sink> = Arc::new(FileSink::from_config(config));
            let pipeline = Arc::new(AsyncSink::new(
                inner,
                &config.tuning,
                config.debug_enabled,
            ));
            (pipeline.clone(), Some(pipeline))
        }
    }
}

/// Derive the admitted mask from the thresholds the selected sink can
/// actually emit. A file sink with neither file output nor console
/// mirroring still admits Fatal, which always reaches the terminal.
fn effective_mask(config: &LogConfig) -> LevelMask {
    match config.sink_kind {
        SinkKind::Stdout => LevelMask::from_threshold(config.stderr_threshold),
        SinkKind::File | SinkKind::AsyncFile => {
            let mut mask = LevelMask::from_threshold(Level::Fatal);
            if config.log_to_file {
                if let Some(threshold) = config.file_threshold {
                    mask = mask.union(LevelMask::from_threshold(threshold));
                }
            }
            if config.log_to_console {
                mask = mask.union(LevelMask::from_threshold(config.stderr_threshold));
            }
            mask
        }
    }
}

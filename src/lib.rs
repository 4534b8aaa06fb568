// SPDX-License-Identifier: Apache-2.0 OR MIT
//! High-throughput asynchronous logging pipeline.
//!
//! Producer threads hand formatted records to a bounded, pool-backed
//! queue; dedicated worker threads drain the queue in batches and emit to
//! a stdout or rolling-file sink. Producer latency stays bounded under
//! overload: excess records are discarded by a priority-aware drop policy
//! instead of parking the producer, and pool exhaustion loses the record
//! with a counter bump. Fatal records bypass the queue, reach the sink
//! synchronously and end the process.
//!
//! Typical wiring:
//!
//! ```ignore
//! use clap::Parser;
//! use relaylog::{LogArgs, LoggerManager};
//!
//! let manager = LoggerManager::instance();
//! manager.setup(LogArgs::parse().into_config())?;
//! manager.setup_logger()?;
//!
//! log_info!("pipeline up");
//!
//! manager.teardown();
//! ```

pub mod config;
pub mod front;
pub mod level;
#[macro_use]
mod macros;
pub mod manager;
pub mod pipeline;
pub mod ratelimit;
pub mod sink;

// Public exports
pub use config::{ConfigError, LogArgs, LogConfig, TuningConfig};
pub use front::{emit, emit_formatted, LOG_STACK_BUFFER_SIZE};
pub use level::{Level, LevelMask, SinkKind};
pub use manager::{LoggerManager, SetupError};
pub use pipeline::{AsyncSink, MetricsSnapshot, MSG_BUFFER_SIZE};
pub use ratelimit::RateLimitedLog;
pub use sink::{FileSink, Sink, SinkError, StdoutSink};

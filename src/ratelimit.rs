// Per-site rate limiting over the producer facade

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::front;
use crate::level::Level;

const NEVER: u64 = u64::MAX;

/// Minimum-interval gate for one logging site.
///
/// Hold one instance per call site. Sharing an instance between threads is
/// allowed but best-effort: two threads racing the same window may both
/// pass. The first call after construction is always admitted.
pub struct RateLimitedLog {
    interval: Duration,
    start: Instant,
    /// Nanoseconds since `start` of the last admitted call
    last_emit: AtomicU64,
}

impl RateLimitedLog {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            start: Instant::now(),
            last_emit: AtomicU64::new(NEVER),
        }
    }

    /// True when the interval has elapsed since the last admitted call;
    /// stamps the new window on success.
    pub fn check(&self) -> bool {
        let now = self.start.elapsed().as_nanos() as u64;
        let last = self.last_emit.load(Ordering::Relaxed);

        if last != NEVER && now.saturating_sub(last) < self.interval.as_nanos() as u64 {
            return false;
        }

        self.last_emit.store(now, Ordering::Relaxed);
        true
    }

    /// Forward a preformatted record when the gate is open.
    pub fn log(&self, level: Level, msg: &str) {
        if self.check() {
            front::emit(level, msg.as_bytes());
        }
    }
}

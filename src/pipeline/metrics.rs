// Pipeline counters
//
// Four independent monotonic counters. Increments are relaxed; a snapshot
// taken while producers are running may be inconsistent by one.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    enqueued: AtomicU64,
    processed: AtomicU64,
    dropped: AtomicU64,
    overflow: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Records accepted into the queue
    pub enqueued: u64,
    /// Records dispatched to the sink and returned to the pool
    pub processed: u64,
    /// Records discarded by the back-pressure policy
    pub dropped: u64,
    /// Records lost to pool exhaustion
    pub overflow: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overflow(&self) {
        self.overflow.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            overflow: self.overflow.load(Ordering::Relaxed),
        }
    }

    /// One-line report printed to stderr at teardown.
    pub fn report(&self) {
        let s = self.snapshot();
        eprintln!(
            "Logger stats - Enqueued: {}, Processed: {}, Dropped: {}, Overflow: {}",
            s.enqueued, s.processed, s.dropped, s.overflow
        );
    }
}

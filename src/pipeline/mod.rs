// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Asynchronous pipeline sink.
//!
//! Producers copy a record into a pooled slot, enqueue it and wake one
//! worker; dedicated worker threads drain the queue in batches and push
//! each record into the wrapped sink. Overload never blocks a producer:
//! excess records are dropped by priority, and pool exhaustion loses the
//! record with a counter bump. Fatal records skip the queue entirely.

mod metrics;
mod pool;
mod queue;

pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pool::{MessagePool, Slot, MSG_BUFFER_SIZE};
pub use queue::MessageQueue;

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::TuningConfig;
use crate::level::Level;
use crate::sink::{Sink, SinkError};

pub struct AsyncSink {
    inner: Arc<dyn Sink>,
    pool: Arc<MessagePool>,
    queue: Arc<MessageQueue>,
    metrics: Arc<PipelineMetrics>,
    batch_size: usize,
    num_workers: usize,
    debug_enabled: bool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Send one drained record into the sink, then return its slot.
///
/// Every drained slot counts as processed, including Debug records
/// swallowed by the debug switch.
fn dispatch(
    inner: &dyn Sink,
    pool: &MessagePool,
    metrics: &PipelineMetrics,
    debug_enabled: bool,
    slot: Slot,
) {
    {
        let payload = pool.payload(&slot);
        match slot.level {
            Level::Verbose => inner.write_verbose(payload),
            Level::Debug if debug_enabled => inner.write_debug(payload),
            Level::Debug => {}
            Level::Info => inner.write_info(payload),
            Level::Warn => inner.write_warn(payload),
            Level::Error => inner.write_error(payload),
            Level::Fatal => inner.write_fatal(payload),
        }
    }

    pool.release(slot);
    metrics.record_processed();
}

impl AsyncSink {
    pub fn new(inner: Arc<dyn Sink>, tuning: &TuningConfig, debug_enabled: bool) -> Self {
        let capacity = tuning.queue_capacity;

        Self {
            inner,
            pool: Arc::new(MessagePool::new(tuning.pool_size)),
            queue: Arc::new(MessageQueue::new(capacity)),
            metrics: Arc::new(PipelineMetrics::new()),
            batch_size: tuning.batch_size,
            num_workers: tuning.num_workers,
            debug_enabled,
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Free slots left in the pool. After teardown this is back to the
    /// configured pool size.
    pub fn pool_available(&self) -> usize {
        self.pool.available()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Decide whether a record is discarded instead of queued.
    ///
    /// Below capacity nothing is dropped. At capacity, Verbose and Debug
    /// always go; moderate overload keeps Warn and above; severe overload
    /// (20% past capacity) keeps only Error and above. Fatal never drops.
    fn should_drop(&self, level: Level, queue_len: usize) -> bool {
        if level == Level::Fatal {
            return false;
        }

        let capacity = self.queue.capacity();
        if queue_len >= capacity {
            if level <= Level::Debug {
                return true;
            }

            // Severe overload begins at 1.2x capacity, kept in integer
            // arithmetic so the boundary is exact for every capacity.
            if 5 * queue_len >= 6 * capacity {
                return level < Level::Error;
            }

            return level < Level::Warn;
        }

        false
    }

    /// The producer path: drop check, slot acquire, enqueue, notify.
    fn submit(&self, level: Level, msg: &[u8]) {
        if self.should_drop(level, self.queue.len()) {
            self.metrics.record_dropped();
            return;
        }

        let Some(slot) = self.pool.acquire(level, msg) else {
            self.metrics.record_overflow();
            return;
        };

        self.queue.enqueue(slot);
        self.metrics.record_enqueued();
    }

    fn spawn_workers(&self) {
        let mut workers = self.workers.lock().unwrap();
        for _ in 0..self.num_workers {
            let inner = Arc::clone(&self.inner);
            let pool = Arc::clone(&self.pool);
            let queue = Arc::clone(&self.queue);
            let metrics = Arc::clone(&self.metrics);
            let batch_size = self.batch_size;
            let debug_enabled = self.debug_enabled;

            workers.push(std::thread::spawn(move || {
                while queue.await_work(batch_size) {
                    for slot in queue.drain_batch(batch_size) {
                        dispatch(inner.as_ref(), &pool, &metrics, debug_enabled, slot);
                    }
                }
            }));
        }
    }
}

impl Sink for AsyncSink {
    fn setup(&self) -> Result<(), SinkError> {
        self.inner.setup()?;
        self.spawn_workers();
        Ok(())
    }

    /// Stop the workers, flush everything still queued, close the inner
    /// sink and print the counters.
    fn teardown(&self) {
        self.queue.shutdown();

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for worker in workers {
            let _ = worker.join();
        }

        // Workers exit only on an empty queue, but drain any residue from
        // a worker that died early.
        loop {
            let batch = self.queue.drain_batch(usize::MAX);
            if batch.is_empty() {
                break;
            }
            for slot in batch {
                dispatch(
                    self.inner.as_ref(),
                    &self.pool,
                    &self.metrics,
                    self.debug_enabled,
                    slot,
                );
            }
        }

        self.inner.teardown();
        self.metrics.report();
    }

    fn write_verbose(&self, msg: &[u8]) {
        self.submit(Level::Verbose, msg);
    }

    fn write_debug(&self, msg: &[u8]) {
        if self.debug_enabled {
            self.submit(Level::Debug, msg);
        }
    }

    fn write_info(&self, msg: &[u8]) {
        self.submit(Level::Info, msg);
    }

    fn write_warn(&self, msg: &[u8]) {
        self.submit(Level::Warn, msg);
    }

    fn write_error(&self, msg: &[u8]) {
        self.submit(Level::Error, msg);
    }

    /// Fatal bypass: straight to the wrapped sink, ahead of everything
    /// still queued. The terminal sink owns process termination.
    fn write_fatal(&self, msg: &[u8]) {
        self.inner.write_fatal(msg);
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        // Workers hold their own Arcs; make sure none are left behind if
        // the owner forgot teardown.
        self.queue.shutdown();
        for worker in std::mem::take(&mut *self.workers.lock().unwrap()) {
            let _ = worker.join();
        }
    }
}

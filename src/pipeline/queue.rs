// FIFO of in-flight records between producers and workers
//
// The queue itself never rejects a record; the capacity decision belongs
// to the producer facade, which inspects the length before acquiring a
// slot. Keeping the queue a pure FIFO concentrates the drop policy in one
// place.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use super::pool::Slot;

struct QueueInner {
    fifo: VecDeque<Slot>,
    shutdown: bool,
}

pub struct MessageQueue {
    inner: Mutex<QueueInner>,
    not_empty: Condvar,
    capacity: usize,
}

impl MessageQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                fifo: VecDeque::with_capacity(capacity),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Push to the tail and wake one waiting worker.
    pub fn enqueue(&self, slot: Slot) {
        let mut inner = self.inner.lock().unwrap();
        inner.fifo.push_back(slot);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Pop up to `max` records in FIFO order under one lock acquisition.
    pub fn drain_batch(&self, max: usize) -> Vec<Slot> {
        let mut inner = self.inner.lock().unwrap();
        let count = inner.fifo.len().min(max);
        inner.fifo.drain(..count).collect()
    }

    /// Current length. Advisory the moment the lock is released.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue pressure as a fraction clamped to 1.0. Reporting only; the
    /// drop policy works from `len` directly.
    pub fn utilization(&self) -> f64 {
        (self.len() as f64 / (self.capacity * 10) as f64).min(1.0)
    }

    /// Block until there is work worth draining. Wakes when shutdown is
    /// signalled, a full batch is queued, or the queue has filled past
    /// half capacity. Returns false when the worker should exit, which
    /// happens only once shutdown is set and the queue is empty.
    pub fn await_work(&self, batch_size: usize) -> bool {
        let half = (self.capacity / 2).max(1);
        let mut inner = self.inner.lock().unwrap();
        while !(inner.shutdown
            || inner.fifo.len() >= batch_size
            || (!inner.fifo.is_empty() && inner.fifo.len() >= half))
        {
            inner = self.not_empty.wait(inner).unwrap();
        }
        !(inner.shutdown && inner.fifo.is_empty())
    }

    /// Set the shutdown flag and wake every worker.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.shutdown = true;
        drop(inner);
        self.not_empty.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn slot(index: usize) -> Slot {
        Slot {
            level: Level::Info,
            len: 0,
            buffer_index: index,
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = MessageQueue::new(8);
        queue.enqueue(slot(0));
        queue.enqueue(slot(1));
        queue.enqueue(slot(2));

        let batch = queue.drain_batch(2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].buffer_index, 0);
        assert_eq!(batch[1].buffer_index, 1);

        let rest = queue.drain_batch(10);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].buffer_index, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue = MessageQueue::new(4);
        assert!(queue.drain_batch(10).is_empty());
    }

    #[test]
    fn test_await_work_wakes_on_batch() {
        let queue = Arc::new(MessageQueue::new(100));
        let waiter = Arc::clone(&queue);
        let handle = thread::spawn(move || waiter.await_work(2));

        thread::sleep(Duration::from_millis(20));
        queue.enqueue(slot(0));
        queue.enqueue(slot(1));

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_await_work_wakes_on_half_capacity() {
        // Capacity 4: two records reach half capacity and wake the worker
        // even though the batch size is far away.
        let queue = Arc::new(MessageQueue::new(4));
        let waiter = Arc::clone(&queue);
        let handle = thread::spawn(move || waiter.await_work(100));

        thread::sleep(Duration::from_millis(20));
        queue.enqueue(slot(0));
        queue.enqueue(slot(1));

        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_shutdown_releases_idle_worker() {
        let queue = Arc::new(MessageQueue::new(100));
        let waiter = Arc::clone(&queue);
        let handle = thread::spawn(move || waiter.await_work(10));

        thread::sleep(Duration::from_millis(20));
        queue.shutdown();

        // Empty queue at shutdown means the worker exits
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn test_shutdown_with_residue_drains_first() {
        let queue = MessageQueue::new(100);
        queue.enqueue(slot(0));
        queue.shutdown();

        // Work remains, so the worker is told to keep going
        assert!(queue.await_work(10));
        let batch = queue.drain_batch(10);
        assert_eq!(batch.len(), 1);
        assert!(!queue.await_work(10));
    }

    #[test]
    fn test_utilization_is_clamped() {
        let queue = MessageQueue::new(2);
        assert_eq!(queue.utilization(), 0.0);
        queue.enqueue(slot(0));
        assert!(queue.utilization() > 0.0);
        assert!(queue.utilization() <= 1.0);
    }
}

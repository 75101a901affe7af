//! Bounded FIFO work queue with fail-fast backpressure.
//!
//! Uses a tokio::sync::mpsc bounded channel. The producer side never
//! awaits: `enqueue` uses `try_send` so the Slack acknowledgement path
//! cannot be held up by a slow worker. When the queue is full the event
//! is rejected and the caller decides what to log.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::types::WorkItem;

/// Why an enqueue attempt was rejected.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// The queue already holds `capacity` items.
    #[error("work queue full (capacity {capacity})")]
    Full {
        /// The fixed capacity the queue was created with.
        capacity: usize,
    },
    /// The worker has gone away and the receiver was dropped.
    #[error("work queue closed")]
    Closed,
}

/// The bounded queue connecting the dispatcher to its single worker.
///
/// - The dispatcher calls `enqueue` (non-blocking, fails fast when full)
/// - Exactly one worker calls `next` and processes items in FIFO order
pub struct WorkQueue {
    tx: mpsc::Sender<WorkItem>,
    rx: tokio::sync::Mutex<mpsc::Receiver<WorkItem>>,
    capacity: usize,
}

impl WorkQueue {
    /// Create a queue with the given fixed capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        WorkQueue {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            capacity,
        }
    }

    /// Attempt to enqueue a work item without blocking.
    pub fn enqueue(&self, item: WorkItem) -> Result<(), EnqueueError> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Take the next work item, waiting until one is available.
    /// Returns `None` once all senders are dropped and the queue drains.
    pub async fn next(&self) -> Option<WorkItem> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }

    /// Number of items currently waiting.
    pub fn depth(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// The fixed capacity the queue was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::types::{WorkItem, WorkKind};

    fn item(text: &str) -> WorkItem {
        WorkItem::new(WorkKind::DirectMessage, "D1", "1.0", text, "U1")
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = WorkQueue::new(10);

        for i in 1..=3 {
            queue.enqueue(item(&format!("msg-{i}"))).unwrap();
        }

        assert_eq!(queue.next().await.unwrap().text, "msg-1");
        assert_eq!(queue.next().await.unwrap().text, "msg-2");
        assert_eq!(queue.next().await.unwrap().text, "msg-3");
    }

    #[tokio::test]
    async fn test_enqueue_fails_fast_when_full() {
        let queue = WorkQueue::new(2);

        queue.enqueue(item("one")).unwrap();
        queue.enqueue(item("two")).unwrap();

        let err = queue.enqueue(item("three")).unwrap_err();
        assert!(matches!(err, EnqueueError::Full { capacity: 2 }));

        // The rejected item is gone; only the first two are delivered.
        assert_eq!(queue.next().await.unwrap().text, "one");
        assert_eq!(queue.next().await.unwrap().text, "two");
    }

    #[tokio::test]
    async fn test_depth_tracks_enqueued_items() {
        let queue = WorkQueue::new(5);
        assert_eq!(queue.depth(), 0);

        queue.enqueue(item("a")).unwrap();
        queue.enqueue(item("b")).unwrap();
        assert_eq!(queue.depth(), 2);

        queue.next().await.unwrap();
        assert_eq!(queue.depth(), 1);
    }

    #[tokio::test]
    async fn test_capacity_reported() {
        let queue = WorkQueue::new(12);
        assert_eq!(queue.capacity(), 12);
    }

    #[tokio::test]
    async fn test_space_frees_after_drain() {
        let queue = WorkQueue::new(1);

        queue.enqueue(item("first")).unwrap();
        assert!(queue.enqueue(item("blocked")).is_err());

        queue.next().await.unwrap();
        queue.enqueue(item("second")).unwrap();
        assert_eq!(queue.next().await.unwrap().text, "second");
    }

    #[tokio::test]
    async fn test_producer_and_consumer_on_separate_tasks() {
        let queue = std::sync::Arc::new(WorkQueue::new(4));

        let q = queue.clone();
        let consumer = tokio::spawn(async move {
            let mut seen = Vec::new();
            for _ in 0..4 {
                seen.push(q.next().await.unwrap().text);
            }
            seen
        });

        for i in 0..4 {
            queue.enqueue(item(&format!("m{i}"))).unwrap();
        }

        let seen = consumer.await.unwrap();
        assert_eq!(seen, vec!["m0", "m1", "m2", "m3"]);
    }
}

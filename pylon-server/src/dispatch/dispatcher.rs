use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{trace, warn};
use url::Url;

/// One delivery request: a destination inbox and the activity to send.
#[derive(Debug, Clone)]
pub struct Push {
    pub inbox: Url,
    pub message: Value,
}

/// Sender side of one worker's queue, plus its depth gauge.
#[derive(Debug, Clone)]
pub(crate) struct QueueHandle {
    pub(crate) tx: mpsc::UnboundedSender<Push>,
    pub(crate) depth: Arc<AtomicUsize>,
}

/// Assigns pushes to the fixed worker pool in round-robin order.
///
/// With `W` workers, push `k` (0-indexed) lands on worker `k mod W` —
/// strictly cyclic, with no load awareness: a worker stuck on a slow
/// delivery still receives its share, so queue depths can diverge
/// under uneven message cost. That is a documented property of the
/// design, not something the dispatcher tries to correct.
///
/// Handlers call [`Dispatcher::push`] concurrently, so the cursor is
/// an atomic rather than a plain counter.
#[derive(Debug)]
pub struct Dispatcher {
    queues: Vec<QueueHandle>,
    cursor: AtomicUsize,
}

impl Dispatcher {
    pub(crate) fn new(queues: Vec<QueueHandle>) -> Self {
        assert!(!queues.is_empty(), "dispatcher requires at least one worker");
        Self {
            queues,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Enqueue a delivery on the next worker's queue.
    ///
    /// Never blocks the caller beyond the queue insertion itself.
    pub fn push(&self, inbox: Url, message: Value) {
        let slot =
            self.cursor.fetch_add(1, Ordering::Relaxed) % self.queues.len();
        let queue = &self.queues[slot];

        queue.depth.fetch_add(1, Ordering::Relaxed);
        if queue.tx.send(Push { inbox, message }).is_err() {
            // Only possible once the pool is being torn down.
            queue.depth.fetch_sub(1, Ordering::Relaxed);
            warn!(worker = slot, "worker queue closed, dropping push");
            return;
        }

        trace!(worker = slot, "push enqueued");
    }

    pub fn worker_count(&self) -> usize {
        self.queues.len()
    }

    /// Index of the worker the next push will be assigned to.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed) % self.queues.len()
    }

    /// Current queue depth per worker, in worker order.
    pub fn queue_depths(&self) -> Vec<usize> {
        self.queues
            .iter()
            .map(|queue| queue.depth.load(Ordering::Relaxed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_dispatcher(
        workers: usize,
    ) -> (Dispatcher, Vec<mpsc::UnboundedReceiver<Push>>) {
        let mut queues = Vec::with_capacity(workers);
        let mut receivers = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, rx) = mpsc::unbounded_channel();
            queues.push(QueueHandle {
                tx,
                depth: Arc::new(AtomicUsize::new(0)),
            });
            receivers.push(rx);
        }
        (Dispatcher::new(queues), receivers)
    }

    fn inbox(name: &str) -> Url {
        format!("https://{name}.example.com/inbox")
            .parse()
            .expect("test inbox URL is valid")
    }

    #[tokio::test]
    async fn assignment_is_exactly_cyclic() {
        let (dispatcher, mut receivers) = test_dispatcher(3);

        for k in 0..7 {
            dispatcher.push(inbox(&format!("host{k}")), json!({"k": k}));
        }

        // Push k goes to worker k mod 3.
        for (worker, expected) in
            [(0, vec![0, 3, 6]), (1, vec![1, 4]), (2, vec![2, 5])]
        {
            for k in expected {
                let push = receivers[worker]
                    .try_recv()
                    .expect("expected push on this worker");
                assert_eq!(push.message, json!({"k": k}));
            }
            assert!(receivers[worker].try_recv().is_err());
        }

        assert_eq!(dispatcher.cursor(), 7 % 3);
    }

    #[tokio::test]
    async fn cursor_wraps_to_zero() {
        let (dispatcher, _receivers) = test_dispatcher(2);
        for k in 0..4 {
            dispatcher.push(inbox(&format!("host{k}")), json!({}));
        }
        assert_eq!(dispatcher.cursor(), 0);
    }

    #[tokio::test]
    async fn per_worker_order_is_fifo() {
        let (dispatcher, mut receivers) = test_dispatcher(2);

        for name in ["a", "b", "c", "d"] {
            dispatcher.push(inbox(name), json!({"to": name}));
        }

        let first = receivers[0].try_recv().expect("worker 0 got a push");
        let second = receivers[0].try_recv().expect("worker 0 got a push");
        assert_eq!(first.message, json!({"to": "a"}));
        assert_eq!(second.message, json!({"to": "c"}));
    }

    #[tokio::test]
    async fn depth_tracks_unconsumed_pushes() {
        let (dispatcher, mut receivers) = test_dispatcher(2);

        for name in ["a", "b", "c"] {
            dispatcher.push(inbox(name), json!({}));
        }
        assert_eq!(dispatcher.queue_depths(), vec![2, 1]);

        // Draining is the worker's job; the gauge only moves there, so
        // receiving here without the worker loop leaves it untouched.
        let _ = receivers[0].try_recv();
        assert_eq!(dispatcher.queue_depths(), vec![2, 1]);
    }
}

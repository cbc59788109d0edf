//! Long-lived delivery workers.
//!
//! Each worker owns one FIFO queue and a tokio task that drains it:
//! dequeue, acquire a gate permit, deliver, release. Shutdown is
//! signalled over a dedicated channel so an idle worker stops
//! immediately instead of waking on a poll interval. An in-flight
//! delivery is allowed to finish; anything still queued when the
//! worker exits is dropped, not drained or persisted.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::sync::mpsc;
use tracing::{info, trace, warn};

use crate::delivery::Deliverer;
use crate::dispatch::dispatcher::{Dispatcher, Push, QueueHandle};
use crate::dispatch::gate::DeliveryGate;

/// The fixed pool of delivery workers, created once at run start.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Worker>,
}

#[derive(Debug)]
struct Worker {
    id: usize,
    handle: tokio::task::JoinHandle<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl WorkerPool {
    /// Spawn `count` workers and return the pool together with the
    /// dispatcher wired to their queues.
    pub fn spawn(
        count: usize,
        gate: Arc<DeliveryGate>,
        deliverer: Arc<dyn Deliverer>,
    ) -> (Self, Dispatcher) {
        let mut workers = Vec::with_capacity(count);
        let mut queues = Vec::with_capacity(count);

        for id in 0..count {
            let (queue_tx, queue_rx) = mpsc::unbounded_channel();
            let depth = Arc::new(AtomicUsize::new(0));
            let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

            let handle = tokio::spawn(worker_loop(
                id,
                queue_rx,
                Arc::clone(&depth),
                Arc::clone(&gate),
                Arc::clone(&deliverer),
                shutdown_rx,
            ));

            queues.push(QueueHandle {
                tx: queue_tx,
                depth,
            });
            workers.push(Worker {
                id,
                handle,
                shutdown_tx,
            });
        }

        info!("started {count} delivery workers");

        (Self { workers }, Dispatcher::new(queues))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Signal every worker and wait for the loops to exit.
    ///
    /// Queued but undelivered pushes are dropped with the queues.
    pub async fn shutdown(self) {
        for worker in &self.workers {
            let _ = worker.shutdown_tx.send(()).await;
        }

        for worker in self.workers {
            if worker.handle.await.is_err() {
                warn!(worker = worker.id, "delivery worker panicked");
            }
        }

        info!("delivery worker pool shut down");
    }
}

async fn worker_loop(
    id: usize,
    mut queue_rx: mpsc::UnboundedReceiver<Push>,
    depth: Arc<AtomicUsize>,
    gate: Arc<DeliveryGate>,
    deliverer: Arc<dyn Deliverer>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    info!(worker = id, "delivery worker started");

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!(worker = id, "delivery worker shutting down");
                break;
            }
            item = queue_rx.recv() => {
                let Some(push) = item else {
                    // Dispatcher dropped; nothing more will arrive.
                    break;
                };
                depth.fetch_sub(1, Ordering::Relaxed);

                let _permit = gate.acquire().await;
                match deliverer.deliver(&push.inbox, &push.message).await {
                    Ok(()) => {
                        trace!(worker = id, inbox = %push.inbox, "push delivered");
                    }
                    // A failed delivery must not take the worker with
                    // it; log and keep draining the queue.
                    Err(err) => {
                        warn!(
                            worker = id,
                            inbox = %push.inbox,
                            error = %err,
                            "delivery failed"
                        );
                    }
                }
            }
        }
    }
}

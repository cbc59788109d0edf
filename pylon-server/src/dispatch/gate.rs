use tokio::sync::{Semaphore, SemaphorePermit};

/// Process-wide cap on simultaneous outbound deliveries.
///
/// Every delivery worker acquires one permit before calling out and
/// holds it for the duration of the call; the permit is returned on
/// drop, so it is released even when the delivery fails. Sized once at
/// construction from `push_limit`. No fairness guarantee beyond what
/// tokio's semaphore provides.
#[derive(Debug)]
pub struct DeliveryGate {
    semaphore: Semaphore,
    capacity: usize,
}

impl DeliveryGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
        }
    }

    /// Suspends until a permit is free.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("delivery gate is never closed")
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

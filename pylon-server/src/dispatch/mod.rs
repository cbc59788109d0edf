//! The push-dispatch core.
//!
//! Route handlers hand `(inbox, message)` pairs to the [`Dispatcher`],
//! which assigns them round-robin onto per-worker FIFO queues. Each
//! [`worker`] task drains its own queue and performs the delivery call
//! behind the process-wide [`gate::DeliveryGate`], the single point of
//! global backpressure for outbound traffic.

pub mod dispatcher;
pub mod gate;
pub mod worker;

pub use dispatcher::{Dispatcher, Push};
pub use gate::DeliveryGate;
pub use worker::WorkerPool;

//! # Pylon Server
//!
//! ActivityPub federation relay. An inbound activity posted to the
//! relay's inbox is fanned out as individual deliveries to every
//! subscribed instance, through a fixed pool of long-lived delivery
//! workers bounded by a process-wide concurrency gate.
//!
//! ## Architecture
//!
//! - [`supervisor`] owns process lifecycle: bind, worker pool spawn,
//!   signal-driven graceful shutdown.
//! - [`dispatch`] is the push core: round-robin assignment onto
//!   per-worker FIFO queues and the global delivery gate.
//! - [`context`] builds the per-request security view (actor,
//!   instance, message, signature) that route handlers consult.
//! - [`delivery`] is the outbound HTTP client seam.

pub mod context;
pub mod delivery;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod state;
pub mod supervisor;

pub use errors::{AppError, AppResult};
pub use state::AppState;

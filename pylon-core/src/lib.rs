//! Shared building blocks for the Pylon federation relay.
//!
//! This crate holds the pieces that have no opinion about HTTP routing
//! or process lifecycle: the bounded per-category LRU caches the relay
//! keeps for fetched documents, and the parser for the `signature`
//! request header that authorizes inbound federation traffic.

pub mod cache;
pub mod signature;

pub use cache::{BoundedCache, CacheRegistry};
pub use signature::{Signature, SignatureError};

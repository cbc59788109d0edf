//! Shared configuration library for Pylon.
//!
//! This crate centralizes config loading and validation for the relay:
//! defaults, the TOML file format, environment overrides, and the
//! warnings surfaced when a deployment looks misconfigured. The server
//! binary consumes these models once at startup; nothing here is
//! re-read at runtime.

pub mod constants;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    CacheConfig, Config, ConfigMetadata, DispatchConfig, ServerConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigWarning, ConfigWarnings};

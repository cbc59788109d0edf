//! Default values baked into a fresh configuration.

pub const DEFAULT_LISTEN: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Placeholder public hostname; deployments must replace it before the
/// relay's actor documents make sense to peers.
pub const DEFAULT_HOSTNAME: &str = "relay.example.com";

/// Global cap on simultaneous outbound deliveries.
pub const DEFAULT_PUSH_LIMIT: usize = 512;

/// Zero means "one worker per available CPU".
pub const DEFAULT_WORKERS: usize = 0;

pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Config file consulted when neither `--config` nor `PYLON_CONFIG`
/// points elsewhere.
pub const DEFAULT_CONFIG_PATH: &str = "pylon.toml";

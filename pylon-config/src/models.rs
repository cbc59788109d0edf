use std::path::PathBuf;

use crate::constants::{
    DEFAULT_CACHE_SIZE, DEFAULT_HOSTNAME, DEFAULT_LISTEN, DEFAULT_PORT,
    DEFAULT_PUSH_LIMIT, DEFAULT_WORKERS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub cache: CacheConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Effective worker count: the configured value, or one per
    /// available CPU when set to zero.
    pub fn worker_count(&self) -> usize {
        if self.dispatch.workers > 0 {
            self.dispatch.workers
        } else {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.listen, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dispatch: DispatchConfig::default(),
            cache: CacheConfig::default(),
            dev_mode: false,
            metadata: ConfigMetadata::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listening socket binds to.
    pub listen: String,
    pub port: u16,
    /// Public hostname peers know this relay by.
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_owned(),
            port: DEFAULT_PORT,
            host: DEFAULT_HOSTNAME.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Delivery worker count; zero means one per available CPU.
    pub workers: usize,
    /// Process-wide cap on simultaneous outbound deliveries.
    pub push_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            push_limit: DEFAULT_PUSH_LIMIT,
        }
    }
}

/// Per-category cache capacities, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub json: usize,
    pub objects: usize,
    pub digests: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            json: DEFAULT_CACHE_SIZE,
            objects: DEFAULT_CACHE_SIZE,
            digests: DEFAULT_CACHE_SIZE,
        }
    }
}

impl CacheConfig {
    pub fn categories(&self) -> [(&'static str, usize); 3] {
        [
            ("json", self.json),
            ("objects", self.objects),
            ("digests", self.digests),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
    /// Set when the `DOCKER_RUNNING` flag is present; logging only.
    pub is_docker: bool,
}

use serde::{Deserialize, Serialize};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub dispatch: FileDispatchConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDispatchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_limit: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digests: Option<usize>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub workers: Option<usize>,
    pub push_limit: Option<usize>,
    pub cache_json: Option<usize>,
    pub cache_objects: Option<usize>,
    pub cache_digests: Option<usize>,
    pub dev_mode: Option<bool>,
    pub is_docker: bool,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            listen: std::env::var("SERVER_HOST").ok(),
            port: parse_var("SERVER_PORT"),
            host: std::env::var("PYLON_HOSTNAME").ok(),
            workers: parse_var("PYLON_WORKERS"),
            push_limit: parse_var("PYLON_PUSH_LIMIT"),
            cache_json: parse_var("PYLON_CACHE_JSON"),
            cache_objects: parse_var("PYLON_CACHE_OBJECTS"),
            cache_digests: parse_var("PYLON_CACHE_DIGESTS"),
            dev_mode: parse_bool_var("DEV_MODE"),
            is_docker: std::env::var("DOCKER_RUNNING").is_ok(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn parse_bool_var(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|s| {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

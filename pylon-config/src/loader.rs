//! Resolution of the effective configuration.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML file,
//! environment variables. Resolution never fails on odd values; it
//! clamps and records a warning instead, so a misconfigured relay
//! still starts and tells the operator what it changed.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::constants::DEFAULT_CONFIG_PATH;
use crate::models::{
    CacheConfig, Config, ConfigMetadata, DispatchConfig, ServerConfig,
};
use crate::sources::{EnvConfig, FileConfig};
use crate::validation::{ConfigWarning, ConfigWarnings};

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit config file path instead of `PYLON_CONFIG` /
    /// the default location.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn load(self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = dotenvy::dotenv().is_ok();

        let explicit = self.path.is_some();
        let path = self
            .path
            .or_else(|| std::env::var("PYLON_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut warnings = ConfigWarnings::default();
        let file = if path.exists() {
            read_file_config(&path)?
        } else {
            // Only an explicitly requested file is allowed to be missing
            // silently; the default location not existing is routine.
            if explicit {
                return Err(ConfigLoadError::Io {
                    path,
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            warnings.push(
                ConfigWarning::new(format!(
                    "config file {} not found, using defaults",
                    path.display()
                ))
                .with_hint("set PYLON_CONFIG or pass --config to use a file"),
            );
            FileConfig::default()
        };

        let metadata = ConfigMetadata {
            config_path: path.exists().then_some(path),
            env_file_loaded,
            is_docker: false,
        };

        let (config, resolve_warnings) =
            resolve(file, EnvConfig::gather(), metadata);
        for warning in resolve_warnings.items {
            warnings.push(warning);
        }

        Ok(ConfigLoad { config, warnings })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge defaults, file values, and environment overrides.
///
/// Pure so it can be tested without touching the process environment.
pub fn resolve(
    file: FileConfig,
    env: EnvConfig,
    mut metadata: ConfigMetadata,
) -> (Config, ConfigWarnings) {
    let mut warnings = ConfigWarnings::default();
    let defaults = Config::default();

    metadata.is_docker = env.is_docker;

    let server = ServerConfig {
        listen: env
            .listen
            .or(file.server.listen)
            .unwrap_or(defaults.server.listen),
        port: env
            .port
            .or(file.server.port)
            .unwrap_or(defaults.server.port),
        host: env
            .host
            .or(file.server.host)
            .unwrap_or(defaults.server.host),
    };

    if server.host == crate::constants::DEFAULT_HOSTNAME {
        warnings.push(
            ConfigWarning::new("public hostname is the placeholder default")
                .with_hint("set PYLON_HOSTNAME or [server] host"),
        );
    }

    let mut dispatch = DispatchConfig {
        workers: env
            .workers
            .or(file.dispatch.workers)
            .unwrap_or(defaults.dispatch.workers),
        push_limit: env
            .push_limit
            .or(file.dispatch.push_limit)
            .unwrap_or(defaults.dispatch.push_limit),
    };

    if dispatch.push_limit == 0 {
        warnings.push(
            ConfigWarning::new("push_limit of 0 would stall all deliveries")
                .with_hint("clamped to 1"),
        );
        dispatch.push_limit = 1;
    }

    let cache = CacheConfig {
        json: env.cache_json.or(file.cache.json).unwrap_or(defaults.cache.json),
        objects: env
            .cache_objects
            .or(file.cache.objects)
            .unwrap_or(defaults.cache.objects),
        digests: env
            .cache_digests
            .or(file.cache.digests)
            .unwrap_or(defaults.cache.digests),
    };

    let dev_mode = env
        .dev_mode
        .or(file.dev_mode)
        .unwrap_or(defaults.dev_mode);

    (
        Config {
            server,
            dispatch,
            cache,
            dev_mode,
            metadata,
        },
        warnings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn resolve_plain(file: FileConfig, env: EnvConfig) -> (Config, ConfigWarnings) {
        resolve(file, env, ConfigMetadata::default())
    }

    #[test]
    fn defaults_apply_when_sources_are_empty() {
        let (config, warnings) =
            resolve_plain(FileConfig::default(), EnvConfig::default());

        assert_eq!(config.server.listen, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.dispatch.push_limit, 512);
        assert_eq!(config.cache.json, 1024);
        assert!(!config.dev_mode);
        // Placeholder hostname warns.
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn file_values_override_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            port = 8443
            host = "relay.example.net"

            [dispatch]
            workers = 4
            push_limit = 16

            [cache]
            digests = 32
            "#,
        )
        .expect("inline toml is valid");

        let (config, warnings) = resolve_plain(file, EnvConfig::default());
        assert_eq!(config.server.port, 8443);
        assert_eq!(config.server.host, "relay.example.net");
        assert_eq!(config.dispatch.workers, 4);
        assert_eq!(config.dispatch.push_limit, 16);
        assert_eq!(config.cache.digests, 32);
        assert_eq!(config.cache.json, 1024);
        assert!(warnings.is_empty());
    }

    #[test]
    fn env_values_override_file_values() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            port = 8443
            host = "relay.example.net"
            "#,
        )
        .expect("inline toml is valid");

        let env = EnvConfig {
            port: Some(9000),
            push_limit: Some(2),
            ..EnvConfig::default()
        };

        let (config, _) = resolve_plain(file, env);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "relay.example.net");
        assert_eq!(config.dispatch.push_limit, 2);
    }

    #[test]
    fn zero_push_limit_is_clamped_with_warning() {
        let env = EnvConfig {
            push_limit: Some(0),
            host: Some("relay.example.net".into()),
            ..EnvConfig::default()
        };

        let (config, warnings) = resolve_plain(FileConfig::default(), env);
        assert_eq!(config.dispatch.push_limit, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings.items[0].message.contains("push_limit"));
    }

    #[test]
    fn worker_count_falls_back_to_cpu_count() {
        let (config, _) =
            resolve_plain(FileConfig::default(), EnvConfig::default());
        assert_eq!(config.dispatch.workers, 0);
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = ConfigLoader::new()
            .with_path("/nonexistent/pylon.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io { .. }));
    }

    #[test]
    fn file_on_disk_is_parsed() {
        let mut file =
            tempfile::NamedTempFile::new().expect("tempfile is creatable");
        writeln!(file, "[dispatch]\nworkers = 3").expect("tempfile is writable");

        let load = ConfigLoader::new()
            .with_path(file.path())
            .load()
            .expect("file parses");
        assert_eq!(load.config.dispatch.workers, 3);
        assert_eq!(
            load.config.metadata.config_path.as_deref(),
            Some(file.path())
        );
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file =
            tempfile::NamedTempFile::new().expect("tempfile is creatable");
        writeln!(file, "not [valid toml").expect("tempfile is writable");

        let err = ConfigLoader::new()
            .with_path(file.path())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }
}

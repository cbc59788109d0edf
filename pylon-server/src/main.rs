use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pylon_config::ConfigLoader;
use pylon_server::delivery::HttpDeliverer;
use pylon_server::supervisor::Supervisor;

#[derive(Parser, Debug)]
#[command(name = "pylon", version, about = "ActivityPub federation relay")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "PYLON_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Override the listen address.
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let load = loader.load().context("configuration failed to load")?;
    let mut config = load.config;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.listen = host;
    }

    for warning in &load.warnings.items {
        match &warning.hint {
            Some(hint) => warn!("{} ({hint})", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    if config.metadata.env_file_loaded {
        info!("loaded environment overrides from .env");
    }
    if config.metadata.is_docker {
        info!("running inside a container");
    }
    info!(
        workers = config.worker_count(),
        push_limit = config.dispatch.push_limit,
        "dispatch configuration in effect"
    );

    let user_agent = format!(
        "pylon/{} (+https://{})",
        env!("CARGO_PKG_VERSION"),
        config.server.host
    );
    let deliverer =
        HttpDeliverer::new(&user_agent).context("delivery client failed to build")?;

    let supervisor = Supervisor::new(Arc::new(config), Arc::new(deliverer));
    supervisor.run().await.context("relay exited with an error")
}

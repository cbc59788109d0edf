//! Process lifecycle: bind, serve, and tear down in order.
//!
//! The supervisor owns startup ordering (bind the listener before any
//! worker exists, so a failed bind leaves nothing to clean up) and
//! shutdown ordering (stop accepting requests, then drain the worker
//! pool). Stop requests arrive either from OS signals or from
//! [`Supervisor::stop`] and are idempotent.

use std::{io, sync::Arc};

use thiserror::Error;
use tokio::{
    net::TcpListener,
    sync::watch,
};
use tracing::{error, info};

use pylon_config::Config;
use pylon_core::CacheRegistry;

use crate::delivery::Deliverer;
use crate::dispatch::{DeliveryGate, WorkerPool};
use crate::registry::InstanceRegistry;
use crate::routes::create_router;
use crate::state::{AppState, Lifecycle};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

pub struct Supervisor {
    config: Arc<Config>,
    deliverer: Arc<dyn Deliverer>,
    lifecycle: Arc<Lifecycle>,
    shutdown: watch::Sender<bool>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(config: Arc<Config>, deliverer: Arc<dyn Deliverer>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            deliverer,
            lifecycle: Arc::new(Lifecycle::default()),
            shutdown,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Request shutdown. Safe to call from any task, any number of
    /// times; only the first call has an effect.
    pub fn stop(&self) {
        if !*self.shutdown.borrow() {
            info!("shutdown requested");
            let _ = self.shutdown.send(true);
        }
    }

    /// Bind, start the worker pool, and serve until stopped.
    ///
    /// The listener is bound first: if the port is taken, no worker is
    /// ever created and the process can exit cleanly.
    pub async fn run(&self) -> Result<(), StartupError> {
        let addr = self.config.bind_addr();
        let listener = match TcpListener::bind(addr.as_str()).await {
            Ok(listener) => listener,
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                error!(port = self.config.server.port, "listen port is already in use");
                return Err(StartupError::PortInUse {
                    port: self.config.server.port,
                });
            }
            Err(source) => return Err(StartupError::Bind { addr, source }),
        };

        let gate = Arc::new(DeliveryGate::new(self.config.dispatch.push_limit));
        let (pool, dispatcher) = WorkerPool::spawn(
            self.config.worker_count(),
            Arc::clone(&gate),
            Arc::clone(&self.deliverer),
        );

        let state = AppState::new(
            Arc::clone(&self.config),
            Arc::new(CacheRegistry::new(self.config.cache.categories())),
            gate,
            Arc::new(dispatcher),
            Arc::new(InstanceRegistry::default()),
            Arc::clone(&self.lifecycle),
        );
        let router = create_router(state);

        self.spawn_signal_listener();
        self.lifecycle.mark_started();

        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, host = %self.config.server.host, "relay listening");

        let mut shutdown_rx = self.shutdown.subscribe();
        let serve_result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // Closed sender counts as a stop request too.
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
            })
            .await;

        pool.shutdown().await;
        self.lifecycle.mark_stopped();
        info!("relay stopped");

        serve_result.map_err(StartupError::Serve)
    }

    fn spawn_signal_listener(&self) {
        let supervisor_shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            wait_for_termination_signal().await;
            info!("termination signal received");
            let _ = supervisor_shutdown.send(true);
        });
    }
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // A signal kind this platform does not deliver is simply skipped.
    async fn wait(kind: SignalKind) {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    }

    tokio::select! {
        _ = wait(SignalKind::interrupt()) => {}
        _ = wait(SignalKind::terminate()) => {}
        _ = wait(SignalKind::hangup()) => {}
        _ = wait(SignalKind::quit()) => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

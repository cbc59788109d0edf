//! Shared fixtures for the integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use pylon_config::Config;
use pylon_core::CacheRegistry;
use pylon_server::AppState;
use pylon_server::delivery::{Deliverer, DeliveryError};
use pylon_server::dispatch::{DeliveryGate, WorkerPool};
use pylon_server::registry::InstanceRegistry;
use pylon_server::state::Lifecycle;

/// Test double that records deliveries and tracks how many run at
/// once. The short sleep keeps deliveries in flight long enough for
/// concurrency assertions to observe overlap.
#[derive(Default)]
pub struct RecordingDeliverer {
    pub delivered: Mutex<Vec<Url>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub fail_host: Option<&'static str>,
}

#[async_trait]
impl Deliverer for RecordingDeliverer {
    async fn deliver(&self, inbox: &Url, _message: &Value) -> Result<(), DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(30)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_host.is_some() && inbox.host_str() == self.fail_host {
            return Err(DeliveryError::Rejected(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        self.delivered.lock().push(inbox.clone());
        Ok(())
    }
}

impl RecordingDeliverer {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().len()
    }
}

/// Poll until `condition` holds, panicking after a couple of seconds.
pub async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

pub struct TestRelay {
    pub state: AppState,
    pub pool: WorkerPool,
    pub deliverer: Arc<RecordingDeliverer>,
}

/// Wire a full application state around a recording deliverer, without
/// binding a socket.
pub fn test_relay(workers: usize, push_limit: usize, dev_mode: bool) -> TestRelay {
    let mut config = Config::default();
    config.dispatch.workers = workers;
    config.dispatch.push_limit = push_limit;
    config.dev_mode = dev_mode;
    let config = Arc::new(config);

    let deliverer = Arc::new(RecordingDeliverer::default());
    let gate = Arc::new(DeliveryGate::new(push_limit));
    let (pool, dispatcher) = WorkerPool::spawn(
        workers,
        Arc::clone(&gate),
        Arc::clone(&deliverer) as Arc<dyn Deliverer>,
    );

    let lifecycle = Arc::new(Lifecycle::default());
    lifecycle.mark_started();

    let state = AppState::new(
        Arc::clone(&config),
        Arc::new(CacheRegistry::new(config.cache.categories())),
        gate,
        Arc::new(dispatcher),
        Arc::new(InstanceRegistry::default()),
        lifecycle,
    );

    TestRelay {
        state,
        pool,
        deliverer,
    }
}

pub fn inbox_url(host: &str) -> Url {
    format!("https://{host}/inbox")
        .parse()
        .expect("test inbox URL is valid")
}

/// A signature header that parses, attributed to `host`.
pub fn signature_header(host: &str) -> String {
    format!(
        "keyId=\"https://{host}/actor#main-key\",algorithm=\"rsa-sha256\",\
         headers=\"(request-target) host date\",signature=\"dGVzdA==\""
    )
}

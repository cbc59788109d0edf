use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use pylon_config::Config;
use pylon_core::CacheRegistry;

use crate::dispatch::{DeliveryGate, Dispatcher};
use crate::registry::InstanceRegistry;

/// Process lifecycle marker shared between the supervisor and the
/// request-facing state.
///
/// `started_at` is set on successful bind and cleared on stop; uptime
/// derives from it. Transitions are one-directional per run, so plain
/// lock-guarded reads are all the coordination this needs.
#[derive(Debug, Default)]
pub struct Lifecycle {
    started_at: RwLock<Option<DateTime<Utc>>>,
}

impl Lifecycle {
    pub fn mark_started(&self) {
        *self.started_at.write() = Some(Utc::now());
    }

    pub fn mark_stopped(&self) {
        *self.started_at.write() = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.read().is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        *self.started_at.read()
    }

    pub fn uptime(&self) -> Duration {
        match self.started_at() {
            Some(started) => Utc::now() - started,
            None => Duration::zero(),
        }
    }
}

/// Everything a route handler can reach, built once at run start and
/// passed in explicitly — no global registry to consult.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub caches: Arc<CacheRegistry>,
    pub gate: Arc<DeliveryGate>,
    pub dispatcher: Arc<Dispatcher>,
    pub registry: Arc<InstanceRegistry>,
    lifecycle: Arc<Lifecycle>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        caches: Arc<CacheRegistry>,
        gate: Arc<DeliveryGate>,
        dispatcher: Arc<Dispatcher>,
        registry: Arc<InstanceRegistry>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            config,
            caches,
            gate,
            dispatcher,
            registry,
            lifecycle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn uptime(&self) -> Duration {
        self.lifecycle.uptime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_zero_before_start_and_after_stop() {
        let lifecycle = Lifecycle::default();
        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.uptime(), Duration::zero());

        lifecycle.mark_started();
        assert!(lifecycle.is_running());

        lifecycle.mark_stopped();
        assert!(!lifecycle.is_running());
        assert_eq!(lifecycle.uptime(), Duration::zero());
    }
}

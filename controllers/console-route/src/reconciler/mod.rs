//! Reconciliation logic for the console route.
//!
//! A pass is split into small pieces, leaves first:
//! - `dependencies`: CA certificate and cluster address lookup
//! - `desired`: builds the desired `Route`
//! - `annotations`: keeps hand-added annotations
//! - `compare`: classifies observed vs desired
//! - `route`: drives one pass and applies create/update/recreate

pub mod annotations;
pub mod compare;
pub mod dependencies;
pub mod desired;
pub mod route;

#[cfg(test)]
mod route_test;

use crate::backoff::FibonacciBackoff;
use crate::config::RouteSettings;
use cluster_client::ClusterClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// What the control loop should do after a pass that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Converged (or updated in place); wait for the next change event
    NoAction,
    /// Run the pass again soon: a dependency is missing, or the route was
    /// just created and needs to be observed again
    Requeue,
}

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(1, 10), // 1 minute min, 10 minutes max
            error_count: 0,
        }
    }
}

/// Reconciles the console route of `CommonWebUI` instances.
pub struct Reconciler {
    pub(crate) cluster_client: Box<dyn ClusterClientTrait + Send + Sync>,
    pub(crate) settings: RouteSettings,
    /// Error tracking per resource (namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(cluster_client: impl ClusterClientTrait + Send + Sync + 'static, settings: RouteSettings) -> Self {
        Self {
            cluster_client: Box::new(cluster_client),
            settings,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records a failed pass and returns how long to wait before the next one,
    /// together with the number of consecutive failures.
    pub fn record_failure(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(BackoffState::new);
                state.error_count += 1;
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (Duration::from_secs(60), 0)
            }
        }
    }

    /// Forget the failure history of a resource (on successful reconciliation)
    pub fn reset_failures(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}

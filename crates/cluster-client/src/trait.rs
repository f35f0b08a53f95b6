//! ClusterClient trait for mocking
//!
//! The reconciler only talks to the cluster through this trait, so unit tests
//! can swap in `MockClusterClient` without an API server.

use crate::error::ClusterError;
use crds::Route;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};

/// Store primitives the console route controller needs.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    // Route operations
    /// Fetches a route by name
    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError>;
    /// Creates a route; fails with AlreadyExists if one with the same name exists
    async fn create_route(&self, route: &Route) -> Result<Route, ClusterError>;
    /// Replaces the route; `metadata.resourceVersion` must come from a fresh read.
    async fn update_route(&self, route: &Route) -> Result<Route, ClusterError>;
    /// Deletes the route, pinned to its uid
    async fn delete_route(&self, route: &Route) -> Result<(), ClusterError>;

    // Dependency lookups
    /// Fetches a secret by name
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError>;
    /// Fetches a config map by name
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, ClusterError>;
}

//! Controller-specific error types.
//!
//! Store failures arrive as [`ClusterError`] and already name the operation
//! and target object; the variants here cover configuration problems and the
//! states only the reconciler can describe.

use cluster_client::ClusterError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the Console Route Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes client construction error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Object store operation failed
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Invalid controller configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cluster info config map exists but does not carry the cluster address
    #[error("{key} is not set in configmap {namespace}/{configmap}")]
    MissingClusterAddress {
        namespace: String,
        configmap: String,
        key: &'static str,
    },

    /// Parent resource was read without a namespace
    #[error("{kind} {name} has no namespace")]
    MissingNamespace { kind: &'static str, name: String },

    /// Controller owner reference could not be built for the route
    #[error("Failed to set owner for route {namespace}/{name}: {reason}")]
    OwnerReference {
        namespace: String,
        name: String,
        reason: String,
    },

    /// Recreate deleted the old route but creating the new one failed
    #[error("Route {namespace}/{name} was deleted for recreate but the new route could not be created, the route is now absent: {source}")]
    RouteRecreateFailed {
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Probe endpoint server failed
    #[error("Probe server failed: {0}")]
    Probe(#[from] std::io::Error),
}

//! Route dependency lookup.
//!
//! The console route needs two inputs that other components publish:
//! the CA certificate the router uses to verify the console backend, and the
//! public cluster address used as the route host. Either may not exist yet
//! while the platform is still installing, which is a reason to wait rather
//! than a failure.

use super::Reconciler;
use crate::error::ControllerError;
use tracing::{debug, error, info};

/// Key in the certificate secret holding the PEM CA bundle
pub const CA_CERT_KEY: &str = "ca.crt";
/// Key in the cluster info config map holding the public address
pub const CLUSTER_ADDRESS_KEY: &str = "cluster_address";

/// Inputs for one pass; never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDependencies {
    /// Raw `ca.crt` bytes
    pub ca_cert: Vec<u8>,
    /// Host the route is published on
    pub route_host: String,
}

/// Result of a dependency lookup that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyStatus {
    /// Both inputs are available
    Ready(RouteDependencies),
    /// A dependency has not been published yet; the message says which
    Pending(String),
}

impl Reconciler {
    /// Reads the CA certificate and cluster address for `namespace`.
    ///
    /// Missing objects (or a secret whose `ca.crt` is not populated yet) yield
    /// `Pending`. A config map without `cluster_address` is a configuration
    /// error and is returned as such.
    pub async fn resolve_route_dependencies(&self, namespace: &str) -> Result<DependencyStatus, ControllerError> {
        let secret_name = &self.settings.cert_secret_name;
        let secret = match self.cluster_client.get_secret(namespace, secret_name).await {
            Ok(secret) => secret,
            Err(e) if e.is_not_found() => {
                info!(secret = %secret_name, "Route destination certificate secret does not exist yet, requeue and try again");
                return Ok(DependencyStatus::Pending(format!(
                    "secret {}/{} not found",
                    namespace, secret_name
                )));
            }
            Err(e) => {
                error!(secret = %secret_name, "Failed to get route destination certificate: {}", e);
                return Err(e.into());
            }
        };

        let ca_cert = secret
            .data
            .as_ref()
            .and_then(|data| data.get(CA_CERT_KEY))
            .map(|bytes| bytes.0.clone())
            .filter(|bytes| !bytes.is_empty());
        let Some(ca_cert) = ca_cert else {
            info!(secret = %secret_name, "{} is not populated yet, requeue and try again", CA_CERT_KEY);
            return Ok(DependencyStatus::Pending(format!(
                "{} not set in secret {}/{}",
                CA_CERT_KEY, namespace, secret_name
            )));
        };

        let configmap_name = &self.settings.cluster_info_configmap_name;
        let config_map = match self.cluster_client.get_config_map(namespace, configmap_name).await {
            Ok(config_map) => config_map,
            Err(e) if e.is_not_found() => {
                info!(configmap = %configmap_name, "Cluster info configmap was not found, requeue and try again");
                return Ok(DependencyStatus::Pending(format!(
                    "configmap {}/{} not found",
                    namespace, configmap_name
                )));
            }
            Err(e) => {
                error!(configmap = %configmap_name, "Failed to get cluster info configmap: {}", e);
                return Err(e.into());
            }
        };

        let route_host = config_map
            .data
            .as_ref()
            .and_then(|data| data.get(CLUSTER_ADDRESS_KEY))
            .filter(|address| !address.is_empty())
            .cloned()
            .ok_or_else(|| ControllerError::MissingClusterAddress {
                namespace: namespace.to_string(),
                configmap: configmap_name.clone(),
                key: CLUSTER_ADDRESS_KEY,
            })?;

        debug!(route_host = %route_host, ca_cert_bytes = ca_cert.len(), "Resolved route dependencies");
        Ok(DependencyStatus::Ready(RouteDependencies { ca_cert, route_host }))
    }
}

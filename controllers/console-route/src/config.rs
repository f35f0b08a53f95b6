//! Controller configuration.
//!
//! Everything is read once from environment variables at startup:
//!
//! | Variable | Default |
//! |---|---|
//! | `WATCH_NAMESPACE` | all namespaces |
//! | `PROBE_BIND_ADDRESS` | `0.0.0.0:8081` |
//! | `UI_CERT_SECRET_NAME` | `common-web-ui-ca-cert` |
//! | `CLUSTER_INFO_CONFIGMAP_NAME` | `ibmcloud-cluster-info` |
//! | `UI_SERVICE_NAME` | `common-web-ui` |
//! | `REQUEUE_SECONDS` | `10` |

use crate::error::ControllerError;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_CERT_SECRET_NAME: &str = "common-web-ui-ca-cert";
pub const DEFAULT_CLUSTER_INFO_CONFIGMAP_NAME: &str = "ibmcloud-cluster-info";
pub const DEFAULT_SERVICE_NAME: &str = "common-web-ui";
const DEFAULT_PROBE_BIND_ADDRESS: &str = "0.0.0.0:8081";
const DEFAULT_REQUEUE_SECONDS: u64 = 10;

/// Names of the objects the console route is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSettings {
    /// Secret holding `ca.crt` for re-encrypt termination
    pub cert_secret_name: String,
    /// Config map holding `cluster_address`
    pub cluster_info_configmap_name: String,
    /// Service the route sends traffic to
    pub service_name: String,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            cert_secret_name: DEFAULT_CERT_SECRET_NAME.to_string(),
            cluster_info_configmap_name: DEFAULT_CLUSTER_INFO_CONFIGMAP_NAME.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

/// Process-level controller settings.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Namespace to watch; `None` watches the whole cluster
    pub namespace: Option<String>,
    /// Listen address for `/healthz` and `/readyz`
    pub probe_bind_address: SocketAddr,
    /// Delay before re-running a pass that asked to be requeued
    pub requeue_after: Duration,
    /// Names of the objects the console route is built from
    pub route: RouteSettings,
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let probe_bind_address = get("PROBE_BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_PROBE_BIND_ADDRESS.to_string());
        let probe_bind_address = probe_bind_address.parse::<SocketAddr>().map_err(|e| {
            ControllerError::InvalidConfig(format!(
                "PROBE_BIND_ADDRESS '{}' is not a socket address: {}",
                probe_bind_address, e
            ))
        })?;

        let requeue_seconds = match get("REQUEUE_SECONDS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ControllerError::InvalidConfig(format!("REQUEUE_SECONDS '{}' is not a number: {}", raw, e))
            })?,
            None => DEFAULT_REQUEUE_SECONDS,
        };
        if requeue_seconds == 0 {
            return Err(ControllerError::InvalidConfig(
                "REQUEUE_SECONDS must be greater than zero".to_string(),
            ));
        }

        let defaults = RouteSettings::default();
        Ok(Self {
            namespace: get("WATCH_NAMESPACE"),
            probe_bind_address,
            requeue_after: Duration::from_secs(requeue_seconds),
            route: RouteSettings {
                cert_secret_name: get("UI_CERT_SECRET_NAME").unwrap_or(defaults.cert_secret_name),
                cluster_info_configmap_name: get("CLUSTER_INFO_CONFIGMAP_NAME")
                    .unwrap_or(defaults.cluster_info_configmap_name),
                service_name: get("UI_SERVICE_NAME").unwrap_or(defaults.service_name),
            },
        })
    }
}

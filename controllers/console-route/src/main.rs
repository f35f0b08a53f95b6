//! Console Route Controller
//!
//! Keeps the `cp-console` OpenShift Route of every `CommonWebUI` instance in
//! line with the desired state computed from:
//! - the console CA certificate secret (re-encrypt destination CA)
//! - the `ibmcloud-cluster-info` config map (public cluster address)
//!
//! Host or target service changes recreate the route; every other drift is
//! patched in place. Annotations added by hand on the route are preserved.

mod backoff;
mod config;
mod controller;
mod error;
mod probes;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube is built with rustls; pick ring explicitly so the provider is deterministic
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A rustls crypto provider was already installed, keeping it");
    }

    info!("Starting Console Route Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Probe address: {}", config.probe_bind_address);
    info!("  CA certificate secret: {}", config.route.cert_secret_name);
    info!("  Cluster info configmap: {}", config.route.cluster_info_configmap_name);
    info!("  Console service: {}", config.route.service_name);
    info!("  Requeue interval: {:?}", config.requeue_after);

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}

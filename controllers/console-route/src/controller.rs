//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the reconciler, the `CommonWebUI` watcher and the probe server
//! together, and runs until one of them stops.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::probes;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use cluster_client::ClusterClient;
use crds::{CommonWebUI, Route};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for the console route.
#[derive(Debug)]
pub struct Controller {
    web_ui_watcher: JoinHandle<Result<(), ControllerError>>,
    probe_server: JoinHandle<Result<(), ControllerError>>,
}

/// Namespaced API when a watch namespace is configured, cluster-wide otherwise.
fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = kube::core::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Console Route Controller");

        // Create Kubernetes client
        let kube_client = Client::try_default().await?;

        let ns = config.namespace.as_deref();
        let web_ui_api: Api<CommonWebUI> = scoped_api(&kube_client, ns);
        let route_api: Api<Route> = scoped_api(&kube_client, ns);
        let secret_api: Api<Secret> = scoped_api(&kube_client, ns);
        let config_map_api: Api<ConfigMap> = scoped_api(&kube_client, ns);

        let reconciler = Arc::new(Reconciler::new(
            ClusterClient::new(kube_client.clone()),
            config.route.clone(),
        ));

        let ready = Arc::new(AtomicBool::new(false));
        let watcher = Watcher::new(
            reconciler,
            web_ui_api,
            route_api,
            secret_api,
            config_map_api,
            config.requeue_after,
            ready.clone(),
        );

        let web_ui_watcher = tokio::spawn(async move { watcher.watch_common_web_uis().await });
        let probe_server = {
            let addr = config.probe_bind_address;
            tokio::spawn(async move { probes::serve(addr, ready).await })
        };

        Ok(Self {
            web_ui_watcher,
            probe_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Console Route Controller running");

        // Wait for either task to exit (they should run forever)
        tokio::select! {
            result = &mut self.web_ui_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("CommonWebUI watcher panicked: {}", e)))??;
            }
            result = &mut self.probe_server => {
                result.map_err(|e| ControllerError::Watch(format!("Probe server panicked: {}", e)))??;
            }
        }

        Ok(())
    }
}

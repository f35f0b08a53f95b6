//! Kubernetes resource watchers.
//!
//! A single `kube_runtime::Controller` over `CommonWebUI`. Besides changes to
//! the parent itself, a pass is triggered when:
//! - the owned `cp-console` route is edited or deleted
//! - the CA certificate secret or the cluster info config map changes; every
//!   `CommonWebUI` in that namespace is reconciled again

use crate::error::ControllerError;
use crate::reconciler::desired::CONSOLE_ROUTE_NAME;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crds::{CommonWebUI, Route};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, ResourceExt};
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconcile and error policy call.
#[derive(Debug)]
struct Context {
    reconciler: Arc<Reconciler>,
    requeue_after: Duration,
}

/// Maps a successful pass onto the controller's next action.
pub fn action_for(outcome: ReconcileOutcome, requeue_after: Duration) -> Action {
    match outcome {
        ReconcileOutcome::Requeue => Action::requeue(requeue_after),
        ReconcileOutcome::NoAction => Action::await_change(),
    }
}

/// Backoff bookkeeping key (`namespace/name`)
fn resource_key(instance: &CommonWebUI) -> String {
    format!("{}/{}", instance.namespace().unwrap_or_default(), instance.name_any())
}

/// `CommonWebUI` instances that depend on an object in `namespace`.
fn instances_in_namespace(
    instances: &[Arc<CommonWebUI>],
    namespace: Option<&str>,
) -> Vec<ObjectRef<CommonWebUI>> {
    let Some(namespace) = namespace else {
        return Vec::new();
    };
    instances
        .iter()
        .filter(|instance| instance.metadata.namespace.as_deref() == Some(namespace))
        .map(|instance| ObjectRef::from_obj(instance.as_ref()))
        .collect()
}

fn name_selector(name: &str) -> watcher::Config {
    watcher::Config::default().fields(&format!("metadata.name={}", name))
}

async fn reconcile(instance: Arc<CommonWebUI>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    if instance.metadata.deletion_timestamp.is_some() {
        // Garbage collection removes the owned route
        let key = resource_key(&instance);
        debug!("CommonWebUI {} is being deleted, skipping", key);
        ctx.reconciler.reset_failures(&key);
        return Ok(Action::await_change());
    }

    let outcome = ctx.reconciler.reconcile_routes(&instance).await?;
    ctx.reconciler.reset_failures(&resource_key(&instance));
    Ok(action_for(outcome, ctx.requeue_after))
}

fn error_policy(instance: Arc<CommonWebUI>, err: &ControllerError, ctx: Arc<Context>) -> Action {
    let key = resource_key(&instance);
    let (delay, failures) = ctx.reconciler.record_failure(&key);
    error!(
        resource = %key,
        failures,
        retry_in_secs = delay.as_secs(),
        "Reconciliation failed: {}", err
    );
    Action::requeue(delay)
}

/// Watches `CommonWebUI` resources and their route dependencies.
#[derive(Debug)]
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    web_ui_api: Api<CommonWebUI>,
    route_api: Api<Route>,
    secret_api: Api<Secret>,
    config_map_api: Api<ConfigMap>,
    requeue_after: Duration,
    ready: Arc<AtomicBool>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        web_ui_api: Api<CommonWebUI>,
        route_api: Api<Route>,
        secret_api: Api<Secret>,
        config_map_api: Api<ConfigMap>,
        requeue_after: Duration,
        ready: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reconciler,
            web_ui_api,
            route_api,
            secret_api,
            config_map_api,
            requeue_after,
            ready,
        }
    }

    /// Starts watching CommonWebUI resources. Runs until the watch streams end.
    pub async fn watch_common_web_uis(&self) -> Result<(), ControllerError> {
        info!("Starting CommonWebUI watcher");

        let settings = &self.reconciler.settings;
        let controller = Controller::new(self.web_ui_api.clone(), watcher::Config::default());
        let secret_store = controller.store();
        let config_map_store = controller.store();

        let context = Arc::new(Context {
            reconciler: self.reconciler.clone(),
            requeue_after: self.requeue_after,
        });

        // Debounce batches the burst of events a recreate produces
        let controller_config = ControllerConfig::default().debounce(Duration::from_secs(1));

        let controller = controller
            .owns(self.route_api.clone(), name_selector(CONSOLE_ROUTE_NAME))
            .watches(
                self.secret_api.clone(),
                name_selector(&settings.cert_secret_name),
                move |secret: Secret| {
                    instances_in_namespace(&secret_store.state(), secret.metadata.namespace.as_deref())
                },
            )
            .watches(
                self.config_map_api.clone(),
                name_selector(&settings.cluster_info_configmap_name),
                move |config_map: ConfigMap| {
                    instances_in_namespace(&config_map_store.state(), config_map.metadata.namespace.as_deref())
                },
            )
            .with_config(controller_config);

        self.ready.store(true, Ordering::SeqCst);

        controller
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok((obj, action)) => debug!("Reconciled CommonWebUI {}: {:?}", obj, action),
                    Err(e) => warn!("CommonWebUI controller error: {}", e),
                }
            })
            .await;

        self.ready.store(false, Ordering::SeqCst);
        Err(ControllerError::Watch("CommonWebUI watch stream ended".to_string()))
    }
}

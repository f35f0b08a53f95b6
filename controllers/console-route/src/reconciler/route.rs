//! Console route reconciler

use super::annotations::merge_annotations;
use super::compare::{classify, RouteDiff};
use super::dependencies::{DependencyStatus, RouteDependencies};
use super::desired::{build_desired_route, console_annotations, DesiredRouteParams, CONSOLE_ROUTE_NAME, CONSOLE_ROUTE_PATH};
use super::{ReconcileOutcome, Reconciler};
use crate::error::ControllerError;
use crds::{CommonWebUI, Route};
use kube::ResourceExt;
use tracing::{debug, error, info, info_span, warn, Instrument};

impl Reconciler {
    /// Runs one pass for the console route of `instance`.
    ///
    /// `Ok(Requeue)` means a dependency is not published yet or the route was
    /// just (re)created; `Ok(NoAction)` means the route matches or was updated
    /// in place.
    pub async fn reconcile_routes(&self, instance: &CommonWebUI) -> Result<ReconcileOutcome, ControllerError> {
        let namespace = instance_namespace(instance)?;
        let span = info_span!("reconcile", name = %instance.name_any(), namespace = %namespace);

        async move {
            let deps = match self.resolve_route_dependencies(&namespace).await? {
                DependencyStatus::Ready(deps) => deps,
                DependencyStatus::Pending(reason) => {
                    info!("Route dependencies not ready ({}), requeue and try again", reason);
                    return Ok(ReconcileOutcome::Requeue);
                }
            };
            let desired = self.desired_route(instance, &namespace, &deps)?;
            self.reconcile_route(desired).await
        }
        .instrument(span)
        .await
    }

    /// Drives the stored route toward `desired`, whose annotations are the
    /// base set.
    pub async fn reconcile_route(&self, mut desired: Route) -> Result<ReconcileOutcome, ControllerError> {
        let name = desired.name_any();
        let namespace = desired.namespace().unwrap_or_default();

        info!(host = %desired.spec.host, path = %desired.spec.path, "Reconciling route {}/{}", namespace, name);

        let mut observed = match self.cluster_client.get_route(&namespace, &name).await {
            Ok(route) => route,
            Err(e) if e.is_not_found() => {
                info!("Route {}/{} not found - creating", namespace, name);
                return match self.cluster_client.create_route(&desired).await {
                    Ok(_) => Ok(ReconcileOutcome::Requeue),
                    Err(e) if e.is_already_exists() => {
                        // Another writer created it between our read and create
                        info!("Route {}/{} already exists", namespace, name);
                        Ok(ReconcileOutcome::Requeue)
                    }
                    Err(e) => {
                        error!("Failed to create new route {}/{}: {}", namespace, name, e);
                        Err(e.into())
                    }
                };
            }
            Err(e) => {
                error!("Failed to get existing route {}/{} for reconciliation: {}", namespace, name, e);
                return Err(e.into());
            }
        };

        debug!("Comparing current and desired routes");
        let merged = merge_annotations(
            observed.annotations(),
            &desired.metadata.annotations.take().unwrap_or_default(),
        );
        desired.metadata.annotations = Some(merged);

        match classify(&observed, &desired) {
            RouteDiff::Equal => {
                debug!("Route {}/{} is up to date", namespace, name);
                Ok(ReconcileOutcome::NoAction)
            }
            RouteDiff::ImmutableDiff => self.recreate_route(&observed, &desired).await,
            RouteDiff::MutableDiff => {
                info!("Updating route {}/{}", namespace, name);
                observed.metadata.name = desired.metadata.name;
                observed.metadata.annotations = desired.metadata.annotations;
                observed.metadata.labels = desired.metadata.labels;
                observed.metadata.owner_references = desired.metadata.owner_references;
                observed.spec = desired.spec;

                self.cluster_client.update_route(&observed).await.map_err(|e| {
                    error!("Failed to update route {}/{}: {}", namespace, name, e);
                    ControllerError::from(e)
                })?;
                Ok(ReconcileOutcome::NoAction)
            }
        }
    }

    /// Deletes `observed` and creates `desired` in its place.
    ///
    /// The two steps are not atomic: once the delete succeeded a failed
    /// create leaves no route behind, and the error says so.
    async fn recreate_route(&self, observed: &Route, desired: &Route) -> Result<ReconcileOutcome, ControllerError> {
        let name = desired.name_any();
        let namespace = desired.namespace().unwrap_or_default();

        warn!(
            old_host = %observed.spec.host,
            new_host = %desired.spec.host,
            old_service = %observed.spec.to.name,
            new_service = %desired.spec.to.name,
            "Route {}/{} host or target changed, recreating", namespace, name
        );

        match self.cluster_client.delete_route(observed).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                // Removed by someone else since we read it; nothing left to delete
                info!("Route {}/{} already deleted, continuing with create", namespace, name);
            }
            Err(e) => {
                error!("Unable to delete existing route {}/{} for recreate: {}", namespace, name, e);
                return Err(e.into());
            }
        }

        match self.cluster_client.create_route(desired).await {
            Ok(_) => Ok(ReconcileOutcome::Requeue),
            Err(e) if e.is_already_exists() => {
                info!("Route {}/{} was recreated by another writer", namespace, name);
                Ok(ReconcileOutcome::Requeue)
            }
            Err(source) => {
                error!("Unable to create new route {}/{} after delete: {}", namespace, name, source);
                Err(ControllerError::RouteRecreateFailed { namespace, name, source })
            }
        }
    }

    /// The route as the next pass would apply it, with hand-added annotations
    /// of the stored route merged in. `None` while dependencies are pending.
    ///
    /// Read-only: never mutates the store.
    pub async fn render_desired_route(&self, instance: &CommonWebUI) -> Result<Option<Route>, ControllerError> {
        let namespace = instance_namespace(instance)?;
        let deps = match self.resolve_route_dependencies(&namespace).await? {
            DependencyStatus::Ready(deps) => deps,
            DependencyStatus::Pending(_) => return Ok(None),
        };
        let mut desired = self.desired_route(instance, &namespace, &deps)?;

        match self.cluster_client.get_route(&namespace, CONSOLE_ROUTE_NAME).await {
            Ok(observed) => {
                let merged = merge_annotations(
                    observed.annotations(),
                    &desired.metadata.annotations.take().unwrap_or_default(),
                );
                desired.metadata.annotations = Some(merged);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Some(desired))
    }

    fn desired_route(
        &self,
        instance: &CommonWebUI,
        namespace: &str,
        deps: &RouteDependencies,
    ) -> Result<Route, ControllerError> {
        build_desired_route(
            DesiredRouteParams {
                name: CONSOLE_ROUTE_NAME,
                namespace,
                annotations: console_annotations(),
                host: &deps.route_host,
                path: CONSOLE_ROUTE_PATH,
                ca_cert: &deps.ca_cert,
                service_name: &self.settings.service_name,
            },
            instance,
        )
    }
}

fn instance_namespace(instance: &CommonWebUI) -> Result<String, ControllerError> {
    instance.namespace().ok_or_else(|| ControllerError::MissingNamespace {
        kind: "CommonWebUI",
        name: instance.name_any(),
    })
}

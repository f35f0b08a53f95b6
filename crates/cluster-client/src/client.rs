//! Kubernetes-backed implementation of [`ClusterClientTrait`].

use crate::cluster_trait::ClusterClientTrait;
use crate::error::{ClusterError, ObjectRef, Operation};
use crds::Route;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, DeleteParams, PostParams, Preconditions};
use kube::Client;
use tracing::debug;

const ROUTE_KIND: &str = "Route";
const SECRET_KIND: &str = "Secret";
const CONFIG_MAP_KIND: &str = "ConfigMap";

/// Cluster client backed by a `kube::Client`
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
}

impl std::fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterClient").finish_non_exhaustive()
    }
}

impl ClusterClient {
    /// Create a new client from an existing Kubernetes client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn routes(&self, namespace: &str) -> Api<Route> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Resolves the namespace/name a route write is aimed at.
fn route_target(operation: Operation, route: &Route) -> Result<ObjectRef, ClusterError> {
    let name = route.metadata.name.as_deref().ok_or_else(|| ClusterError::InvalidObject {
        operation,
        kind: ROUTE_KIND,
        reason: "metadata.name is not set".to_string(),
    })?;
    let namespace = route.metadata.namespace.as_deref().ok_or_else(|| ClusterError::InvalidObject {
        operation,
        kind: ROUTE_KIND,
        reason: format!("metadata.namespace is not set on {}", name),
    })?;
    Ok(ObjectRef::new(ROUTE_KIND, namespace, name))
}

#[async_trait::async_trait]
impl ClusterClientTrait for ClusterClient {
    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError> {
        debug!(namespace, name, "GET route");
        self.routes(namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(Operation::Get, ObjectRef::new(ROUTE_KIND, namespace, name), e))
    }

    async fn create_route(&self, route: &Route) -> Result<Route, ClusterError> {
        let target = route_target(Operation::Create, route)?;
        debug!(namespace = %target.namespace, name = %target.name, "POST route");
        self.routes(&target.namespace)
            .create(&PostParams::default(), route)
            .await
            .map_err(|e| ClusterError::from_kube(Operation::Create, target, e))
    }

    async fn update_route(&self, route: &Route) -> Result<Route, ClusterError> {
        let target = route_target(Operation::Update, route)?;
        debug!(
            namespace = %target.namespace,
            name = %target.name,
            resource_version = ?route.metadata.resource_version,
            "PUT route"
        );
        self.routes(&target.namespace)
            .replace(&target.name, &PostParams::default(), route)
            .await
            .map_err(|e| ClusterError::from_kube(Operation::Update, target, e))
    }

    async fn delete_route(&self, route: &Route) -> Result<(), ClusterError> {
        let target = route_target(Operation::Delete, route)?;
        debug!(namespace = %target.namespace, name = %target.name, uid = ?route.metadata.uid, "DELETE route");
        // Pin the uid so a route recreated by someone else in between is left alone
        let params = DeleteParams {
            preconditions: route.metadata.uid.clone().map(|uid| Preconditions {
                uid: Some(uid),
                resource_version: None,
            }),
            ..DeleteParams::default()
        };
        self.routes(&target.namespace)
            .delete(&target.name, &params)
            .await
            .map(|_| ())
            .map_err(|e| ClusterError::from_kube(Operation::Delete, target, e))
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError> {
        debug!(namespace, name, "GET secret");
        Api::<Secret>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| ClusterError::from_kube(Operation::Get, ObjectRef::new(SECRET_KIND, namespace, name), e))
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, ClusterError> {
        debug!(namespace, name, "GET configmap");
        Api::<ConfigMap>::namespaced(self.client.clone(), namespace)
            .get(name)
            .await
            .map_err(|e| {
                ClusterError::from_kube(Operation::Get, ObjectRef::new(CONFIG_MAP_KIND, namespace, name), e)
            })
    }
}

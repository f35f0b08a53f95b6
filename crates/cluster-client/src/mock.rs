//! Mock ClusterClient for unit testing
//!
//! Keeps routes, secrets and config maps in memory, records every call in
//! order, and can be configured to fail specific operations so reconcilers can
//! be exercised against races and API errors without a cluster.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::{ClusterError, ObjectRef, Operation};
use crds::Route;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

/// A call made against the mock, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetRoute { namespace: String, name: String },
    CreateRoute { namespace: String, name: String, host: String },
    UpdateRoute { namespace: String, name: String },
    DeleteRoute { namespace: String, name: String },
    GetSecret { namespace: String, name: String },
    GetConfigMap { namespace: String, name: String },
}

impl StoreCall {
    /// Whether the call changes store state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            StoreCall::CreateRoute { .. } | StoreCall::UpdateRoute { .. } | StoreCall::DeleteRoute { .. }
        )
    }
}

/// Failure returned instead of performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    NotFound,
    AlreadyExists,
    Conflict,
    /// API status error, e.g. 403 or 500
    Status { code: u16, message: String },
}

impl InjectedFailure {
    fn into_error(self, operation: Operation, target: ObjectRef) -> ClusterError {
        match self {
            InjectedFailure::NotFound => ClusterError::NotFound { target },
            InjectedFailure::AlreadyExists => ClusterError::AlreadyExists { target },
            InjectedFailure::Conflict => ClusterError::Conflict { operation, target },
            InjectedFailure::Status { code, message } => ClusterError::Api {
                operation,
                target,
                code,
                message,
            },
        }
    }
}

/// Operations failures can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    GetRoute,
    CreateRoute,
    UpdateRoute,
    DeleteRoute,
    GetSecret,
    GetConfigMap,
}

/// Mock ClusterClient for testing
#[derive(Clone, Debug, Default)]
pub struct MockClusterClient {
    routes: Arc<Mutex<HashMap<Key, Route>>>,
    secrets: Arc<Mutex<HashMap<Key, Secret>>>,
    config_maps: Arc<Mutex<HashMap<Key, ConfigMap>>>,
    failures: Arc<Mutex<HashMap<MockOp, InjectedFailure>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    // Counter for generating resource versions and uids
    next_version: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key_of(namespace: Option<&str>, name: Option<&str>) -> Key {
    (
        namespace.unwrap_or_default().to_string(),
        name.unwrap_or_default().to_string(),
    )
}

impl MockClusterClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route to the mock store (for test setup)
    pub fn add_route(&self, mut route: Route) {
        if route.metadata.resource_version.is_none() {
            route.metadata.resource_version = Some(self.next_version().to_string());
        }
        if route.metadata.uid.is_none() {
            route.metadata.uid = Some(format!("route-uid-{}", self.next_version()));
        }
        let key = key_of(route.metadata.namespace.as_deref(), route.metadata.name.as_deref());
        lock(&self.routes).insert(key, route);
    }

    /// Add a secret to the mock store (for test setup)
    pub fn add_secret(&self, secret: Secret) {
        let key = key_of(secret.metadata.namespace.as_deref(), secret.metadata.name.as_deref());
        lock(&self.secrets).insert(key, secret);
    }

    /// Add a config map to the mock store (for test setup)
    pub fn add_config_map(&self, config_map: ConfigMap) {
        let key = key_of(
            config_map.metadata.namespace.as_deref(),
            config_map.metadata.name.as_deref(),
        );
        lock(&self.config_maps).insert(key, config_map);
    }

    /// Make every subsequent `op` fail with `failure` until cleared
    pub fn fail_on(&self, op: MockOp, failure: InjectedFailure) {
        lock(&self.failures).insert(op, failure);
    }

    /// Lets `op` succeed again
    pub fn clear_failure(&self, op: MockOp) {
        lock(&self.failures).remove(&op);
    }

    /// Current stored route, if any
    pub fn route(&self, namespace: &str, name: &str) -> Option<Route> {
        lock(&self.routes)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// All calls made so far, oldest first
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    /// Calls that changed store state
    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_mutation).collect()
    }

    /// Forgets recorded calls; stored objects are kept
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn next_version(&self) -> u64 {
        let mut version = lock(&self.next_version);
        *version += 1;
        *version
    }

    fn record(&self, call: StoreCall) {
        lock(&self.calls).push(call);
    }

    fn injected(&self, op: MockOp, operation: Operation, target: &ObjectRef) -> Result<(), ClusterError> {
        match lock(&self.failures).get(&op).cloned() {
            Some(failure) => Err(failure.into_error(operation, target.clone())),
            None => Ok(()),
        }
    }
}

fn route_ref(route: &Route) -> ObjectRef {
    ObjectRef::new(
        "Route",
        route.metadata.namespace.clone().unwrap_or_default(),
        route.metadata.name.clone().unwrap_or_default(),
    )
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn get_route(&self, namespace: &str, name: &str) -> Result<Route, ClusterError> {
        self.record(StoreCall::GetRoute {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let target = ObjectRef::new("Route", namespace, name);
        self.injected(MockOp::GetRoute, Operation::Get, &target)?;
        self.route(namespace, name)
            .ok_or(ClusterError::NotFound { target })
    }

    async fn create_route(&self, route: &Route) -> Result<Route, ClusterError> {
        let target = route_ref(route);
        self.record(StoreCall::CreateRoute {
            namespace: target.namespace.clone(),
            name: target.name.clone(),
            host: route.spec.host.clone(),
        });
        self.injected(MockOp::CreateRoute, Operation::Create, &target)?;

        let key = (target.namespace.clone(), target.name.clone());
        if lock(&self.routes).contains_key(&key) {
            return Err(ClusterError::AlreadyExists { target });
        }
        let mut created = route.clone();
        let version = self.next_version();
        created.metadata.resource_version = Some(version.to_string());
        created.metadata.uid = Some(format!("route-uid-{}", version));
        lock(&self.routes).insert(key, created.clone());
        Ok(created)
    }

    async fn update_route(&self, route: &Route) -> Result<Route, ClusterError> {
        let target = route_ref(route);
        self.record(StoreCall::UpdateRoute {
            namespace: target.namespace.clone(),
            name: target.name.clone(),
        });
        self.injected(MockOp::UpdateRoute, Operation::Update, &target)?;

        let key = (target.namespace.clone(), target.name.clone());
        let stored_version = match lock(&self.routes).get(&key) {
            Some(stored) => stored.metadata.resource_version.clone(),
            None => return Err(ClusterError::NotFound { target }),
        };
        if stored_version != route.metadata.resource_version {
            return Err(ClusterError::Conflict {
                operation: Operation::Update,
                target,
            });
        }
        let mut updated = route.clone();
        updated.metadata.resource_version = Some(self.next_version().to_string());
        lock(&self.routes).insert(key, updated.clone());
        Ok(updated)
    }

    async fn delete_route(&self, route: &Route) -> Result<(), ClusterError> {
        let target = route_ref(route);
        self.record(StoreCall::DeleteRoute {
            namespace: target.namespace.clone(),
            name: target.name.clone(),
        });
        self.injected(MockOp::DeleteRoute, Operation::Delete, &target)?;

        let key = (target.namespace.clone(), target.name.clone());
        match lock(&self.routes).remove(&key) {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound { target }),
        }
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, ClusterError> {
        self.record(StoreCall::GetSecret {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let target = ObjectRef::new("Secret", namespace, name);
        self.injected(MockOp::GetSecret, Operation::Get, &target)?;
        lock(&self.secrets)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(ClusterError::NotFound { target })
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, ClusterError> {
        self.record(StoreCall::GetConfigMap {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let target = ObjectRef::new("ConfigMap", namespace, name);
        self.injected(MockOp::GetConfigMap, Operation::Get, &target)?;
        lock(&self.config_maps)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(ClusterError::NotFound { target })
    }
}

//! Desired console route construction.

use crate::error::ControllerError;
use crds::{
    CommonWebUI, InsecureEdgeTerminationPolicy, Route, RoutePort, RouteSpec, RouteTargetReference, TlsConfig,
    TlsTermination, WildcardPolicy,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::error;

/// Name of the managed route
pub const CONSOLE_ROUTE_NAME: &str = "cp-console";
/// Path the console is served under
pub const CONSOLE_ROUTE_PATH: &str = "/";
/// Port the console service listens on
pub const CONSOLE_TARGET_PORT: i32 = 3000;
/// Single backend, so it always carries the full weight
pub const CONSOLE_TARGET_WEIGHT: i32 = 100;

const MANAGED_BY: &str = "ibm-commonui-operator";

/// Router timeout and rate limiting applied to the console route.
pub fn console_annotations() -> BTreeMap<String, String> {
    [
        ("haproxy.router.openshift.io/timeout", "90s"),
        ("haproxy.router.openshift.io/pod-concurrent-connections", "100"),
        ("haproxy.router.openshift.io/rate-limit-connections", "true"),
        ("haproxy.router.openshift.io/rate-limit-connections.concurrent-tcp", "100"),
        ("haproxy.router.openshift.io/rate-limit-connections.rate-http", "100"),
        ("haproxy.router.openshift.io/rate-limit-connections.rate-tcp", "100"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Standard labels for objects managed alongside the console.
pub fn labels_for_metadata(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("app".to_string(), name.to_string()),
        ("app.kubernetes.io/name".to_string(), name.to_string()),
        ("app.kubernetes.io/instance".to_string(), name.to_string()),
        ("app.kubernetes.io/managed-by".to_string(), MANAGED_BY.to_string()),
    ])
}

/// Everything the desired route is derived from, besides its owner.
#[derive(Debug, Clone)]
pub struct DesiredRouteParams<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    /// Base annotation set; hand-added keys are merged in later
    pub annotations: BTreeMap<String, String>,
    pub host: &'a str,
    pub path: &'a str,
    pub ca_cert: &'a [u8],
    pub service_name: &'a str,
}

/// Builds the route as it should exist, owned by `owner`.
///
/// Fails only when a controller owner reference cannot be formed: the owner
/// has no name or uid yet, or lives in a different namespace (owner
/// references cannot cross namespaces).
pub fn build_desired_route(params: DesiredRouteParams<'_>, owner: &CommonWebUI) -> Result<Route, ControllerError> {
    let owner_error = |reason: String| {
        error!(name = %params.name, namespace = %params.namespace, "Failed to set owner for route: {}", reason);
        ControllerError::OwnerReference {
            namespace: params.namespace.to_string(),
            name: params.name.to_string(),
            reason,
        }
    };

    let owner_namespace = owner.namespace();
    if owner_namespace.as_deref() != Some(params.namespace) {
        return Err(owner_error(format!(
            "owner {} is in namespace {:?}, route is in {}",
            owner.name_any(),
            owner_namespace,
            params.namespace
        )));
    }
    let owner_ref = owner
        .controller_owner_ref(&())
        .ok_or_else(|| owner_error(format!("owner {} has no name or uid", owner.name_any())))?;

    Ok(Route {
        metadata: ObjectMeta {
            name: Some(params.name.to_string()),
            namespace: Some(params.namespace.to_string()),
            annotations: Some(params.annotations),
            labels: Some(labels_for_metadata(params.name)),
            owner_references: Some(vec![owner_ref]),
            ..Default::default()
        },
        spec: RouteSpec {
            host: params.host.to_string(),
            path: params.path.to_string(),
            port: Some(RoutePort {
                target_port: IntOrString::Int(CONSOLE_TARGET_PORT),
            }),
            to: RouteTargetReference {
                kind: "Service".to_string(),
                name: params.service_name.to_string(),
                weight: Some(CONSOLE_TARGET_WEIGHT),
            },
            wildcard_policy: WildcardPolicy::None,
            tls: Some(TlsConfig {
                termination: TlsTermination::Reencrypt,
                insecure_edge_termination_policy: Some(InsecureEdgeTerminationPolicy::Redirect),
                destination_ca_certificate: String::from_utf8_lossy(params.ca_cert).into_owned(),
            }),
        },
        status: None,
    })
}

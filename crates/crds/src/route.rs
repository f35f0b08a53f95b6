//! OpenShift Route (`route.openshift.io/v1`)
//!
//! Only the fields the console route controller manages are modelled. The CRD
//! itself is owned by OpenShift, so no schema is generated for it.
//!
//! Once a route is created, `host` and the `to` target may not be changed;
//! routers resolve host conflicts by picking the oldest route.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[kube(
    group = "route.openshift.io",
    version = "v1",
    kind = "Route",
    namespaced,
    status = "RouteStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Public hostname; immutable once the route exists
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    /// Path the router matches against
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// Backend port selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<RoutePort>,

    /// Backend the route points at
    pub to: RouteTargetReference,

    #[serde(default)]
    pub wildcard_policy: WildcardPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoutePort {
    pub target_port: IntOrString,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    /// Referent kind, normally `Service`
    pub kind: String,

    /// Referent name; immutable once the route exists
    pub name: String,

    /// Relative weight of this backend (0-256)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WildcardPolicy {
    #[default]
    None,
    Subdomain,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    pub termination: TlsTermination,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_edge_termination_policy: Option<InsecureEdgeTerminationPolicy>,

    /// PEM CA bundle the router uses to verify the backend in `reencrypt` mode
    #[serde(rename = "destinationCACertificate", default, skip_serializing_if = "String::is_empty")]
    pub destination_ca_certificate: String,
}

/// Where TLS is terminated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TlsTermination {
    #[default]
    Edge,
    Passthrough,
    /// Router terminates TLS and opens a new TLS connection to the backend
    Reencrypt,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsecureEdgeTerminationPolicy {
    None,
    Allow,
    Redirect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatus {
    /// Routers that have admitted this route
    #[serde(default)]
    pub ingress: Vec<RouteIngress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_canonical_hostname: Option<String>,
}

//! Observed vs desired route classification.

use crds::Route;
use std::collections::BTreeMap;

/// How an observed route relates to the desired one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDiff {
    /// Nothing to write
    Equal,
    /// Differences the API server accepts in an update
    MutableDiff,
    /// `host` or the `to` target changed; the route must be recreated
    ImmutableDiff,
}

/// Classifies `observed` against `desired`.
///
/// Annotations must already be merged into `desired`. Only the fields the
/// controller sets are compared; status and server-managed metadata
/// (resourceVersion, uid, timestamps, managedFields) never cause a diff.
pub fn classify(observed: &Route, desired: &Route) -> RouteDiff {
    let (observed_spec, desired_spec) = (&observed.spec, &desired.spec);
    if observed_spec.host != desired_spec.host
        || observed_spec.to.name != desired_spec.to.name
        || observed_spec.to.kind != desired_spec.to.kind
    {
        return RouteDiff::ImmutableDiff;
    }

    let (observed_meta, desired_meta) = (&observed.metadata, &desired.metadata);
    let metadata_differs = observed_meta.name != desired_meta.name
        || or_empty(&observed_meta.annotations) != or_empty(&desired_meta.annotations)
        || or_empty(&observed_meta.labels) != or_empty(&desired_meta.labels)
        || observed_meta.owner_references.as_deref().unwrap_or_default()
            != desired_meta.owner_references.as_deref().unwrap_or_default();

    if metadata_differs || observed_spec != desired_spec {
        RouteDiff::MutableDiff
    } else {
        RouteDiff::Equal
    }
}

fn or_empty(map: &Option<BTreeMap<String, String>>) -> BTreeMap<String, String> {
    map.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::desired::{build_desired_route, console_annotations, DesiredRouteParams};
    use crate::test_utils::create_test_common_web_ui;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    const NS: &str = "ibm-common-services";

    fn desired() -> Route {
        let owner = create_test_common_web_ui("example-commonwebui", NS);
        build_desired_route(
            DesiredRouteParams {
                name: "cp-console",
                namespace: NS,
                annotations: console_annotations(),
                host: "console.example.com",
                path: "/",
                ca_cert: b"CERTDATA",
                service_name: "common-web-ui",
            },
            &owner,
        )
        .unwrap()
    }

    #[test]
    fn test_identical_routes_are_equal() {
        assert_eq!(classify(&desired(), &desired()), RouteDiff::Equal);
    }

    #[test]
    fn test_server_managed_fields_ignored() {
        let mut observed = desired();
        observed.metadata.resource_version = Some("1234".to_string());
        observed.metadata.uid = Some("abc".to_string());
        observed.metadata.generation = Some(3);
        observed.status = Some(crds::RouteStatus {
            ingress: vec![crds::RouteIngress {
                host: Some("console.example.com".to_string()),
                router_name: Some("default".to_string()),
                router_canonical_hostname: None,
            }],
        });

        assert_eq!(classify(&observed, &desired()), RouteDiff::Equal);
    }

    #[test]
    fn test_mutable_fields() {
        let mut observed = desired();
        observed.spec.path = "/console".to_string();
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        observed.spec.port = Some(crds::RoutePort { target_port: IntOrString::Int(8443) });
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        observed.spec.to.weight = Some(50);
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        observed.spec.tls = None;
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        observed.metadata.labels = None;
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        observed.metadata.owner_references = None;
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);

        let mut observed = desired();
        if let Some(annotations) = observed.metadata.annotations.as_mut() {
            annotations.insert("haproxy.router.openshift.io/timeout".to_string(), "30s".to_string());
        }
        assert_eq!(classify(&observed, &desired()), RouteDiff::MutableDiff);
    }

    #[test]
    fn test_immutable_fields() {
        let mut observed = desired();
        observed.spec.host = "old.example.com".to_string();
        assert_eq!(classify(&observed, &desired()), RouteDiff::ImmutableDiff);

        let mut observed = desired();
        observed.spec.to.name = "legacy-ui".to_string();
        assert_eq!(classify(&observed, &desired()), RouteDiff::ImmutableDiff);

        let mut observed = desired();
        observed.spec.to.kind = "Ingress".to_string();
        assert_eq!(classify(&observed, &desired()), RouteDiff::ImmutableDiff);
    }

    #[test]
    fn test_immutable_takes_precedence() {
        let mut observed = desired();
        observed.spec.host = "old.example.com".to_string();
        observed.spec.path = "/console".to_string();
        observed.metadata.labels = None;

        assert_eq!(classify(&observed, &desired()), RouteDiff::ImmutableDiff);
    }

    #[test]
    fn test_missing_and_empty_maps_compare_equal() {
        let mut observed = desired();
        let mut wanted = desired();
        observed.metadata.labels = None;
        wanted.metadata.labels = Some(BTreeMap::new());

        assert_eq!(classify(&observed, &wanted), RouteDiff::Equal);
    }
}

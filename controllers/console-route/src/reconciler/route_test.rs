//! Unit tests for the console route reconciler

use super::desired::console_annotations;
use super::ReconcileOutcome;
use crate::error::ControllerError;
use crate::test_utils::*;
use cluster_client::{InjectedFailure, MockClusterClient, MockOp, StoreCall};
use crds::{InsecureEdgeTerminationPolicy, Route, TlsTermination};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

const NS: &str = "ibm-common-services";
const HOST: &str = "console.example.com";

fn create_call(host: &str) -> StoreCall {
    StoreCall::CreateRoute {
        namespace: NS.to_string(),
        name: "cp-console".to_string(),
        host: host.to_string(),
    }
}

fn delete_call() -> StoreCall {
    StoreCall::DeleteRoute {
        namespace: NS.to_string(),
        name: "cp-console".to_string(),
    }
}

fn update_call() -> StoreCall {
    StoreCall::UpdateRoute {
        namespace: NS.to_string(),
        name: "cp-console".to_string(),
    }
}

/// Runs a first pass so the mock holds the route exactly as the controller
/// would create it, then forgets the calls made so far.
async fn converged(mock: &MockClusterClient) -> Route {
    let reconciler = create_test_reconciler(mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    reconciler.reconcile_routes(&instance).await.unwrap();
    mock.reset_calls();
    mock.route(NS, "cp-console").unwrap()
}

#[tokio::test]
async fn test_creates_route_when_absent() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);

    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Requeue);
    assert_eq!(mock.mutations(), vec![create_call(HOST)]);

    let route = mock.route(NS, "cp-console").unwrap();
    assert_eq!(route.spec.host, HOST);
    assert_eq!(route.spec.path, "/");
    assert_eq!(route.spec.port.unwrap().target_port, IntOrString::Int(3000));
    let tls = route.spec.tls.unwrap();
    assert_eq!(tls.termination, TlsTermination::Reencrypt);
    assert_eq!(tls.insecure_edge_termination_policy, Some(InsecureEdgeTerminationPolicy::Redirect));
    assert_eq!(tls.destination_ca_certificate, "CERTDATA");
    assert_eq!(route.metadata.annotations, Some(console_annotations()));
}

#[tokio::test]
async fn test_missing_cluster_address_makes_no_store_mutation() {
    let mock = MockClusterClient::new();
    mock.add_secret(create_test_ca_secret(NS, Some(b"CERTDATA")));
    mock.add_config_map(create_test_cluster_info(NS, None));
    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);

    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::MissingClusterAddress { .. }));
    assert!(err.to_string().contains("cluster_address"));
    assert!(mock.mutations().is_empty());
    assert!(!mock.calls().iter().any(|c| matches!(c, StoreCall::GetRoute { .. })));
}

#[tokio::test]
async fn test_pending_dependencies_requeue_without_touching_route() {
    let mock = MockClusterClient::new();
    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);

    // Secret missing
    assert_eq!(reconciler.reconcile_routes(&instance).await.unwrap(), ReconcileOutcome::Requeue);

    // Secret present, config map missing
    mock.add_secret(create_test_ca_secret(NS, Some(b"CERTDATA")));
    assert_eq!(reconciler.reconcile_routes(&instance).await.unwrap(), ReconcileOutcome::Requeue);

    assert!(mock.mutations().is_empty());
    assert!(mock.route(NS, "cp-console").is_none());
}

#[tokio::test]
async fn test_host_change_deletes_then_creates() {
    let mock = create_mock_with_dependencies(NS, "old.example.com");
    converged(&mock).await;
    mock.add_config_map(create_test_cluster_info(NS, Some(HOST)));

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Requeue);
    assert_eq!(mock.mutations(), vec![delete_call(), create_call(HOST)]);
    assert_eq!(mock.route(NS, "cp-console").unwrap().spec.host, HOST);
}

#[tokio::test]
async fn test_host_change_delete_failure_skips_create() {
    let mock = create_mock_with_dependencies(NS, "old.example.com");
    converged(&mock).await;
    mock.add_config_map(create_test_cluster_info(NS, Some(HOST)));
    mock.fail_on(
        MockOp::DeleteRoute,
        InjectedFailure::Status { code: 500, message: "etcdserver: request timed out".to_string() },
    );

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::Cluster(ref e) if e.to_string().contains("delete Route")));
    assert_eq!(mock.mutations(), vec![delete_call()]);
    assert_eq!(mock.route(NS, "cp-console").unwrap().spec.host, "old.example.com");
}

#[tokio::test]
async fn test_host_change_route_already_deleted_still_creates() {
    let mock = create_mock_with_dependencies(NS, "old.example.com");
    converged(&mock).await;
    mock.add_config_map(create_test_cluster_info(NS, Some(HOST)));
    mock.fail_on(MockOp::DeleteRoute, InjectedFailure::NotFound);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Requeue);
    assert_eq!(mock.mutations(), vec![delete_call(), create_call(HOST)]);
}

#[tokio::test]
async fn test_recreate_create_failure_reports_route_absent() {
    let mock = create_mock_with_dependencies(NS, "old.example.com");
    converged(&mock).await;
    mock.add_config_map(create_test_cluster_info(NS, Some(HOST)));
    mock.fail_on(
        MockOp::CreateRoute,
        InjectedFailure::Status { code: 422, message: "host is invalid".to_string() },
    );

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::RouteRecreateFailed { .. }));
    assert!(err.to_string().contains("now absent"));
    assert!(mock.route(NS, "cp-console").is_none());
}

#[tokio::test]
async fn test_service_change_recreates() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let mut stored = converged(&mock).await;
    stored.spec.to.name = "legacy-web-ui".to_string();
    mock.add_route(stored);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Requeue);
    assert_eq!(mock.mutations(), vec![delete_call(), create_call(HOST)]);
    assert_eq!(mock.route(NS, "cp-console").unwrap().spec.to.name, "common-web-ui");
}

#[tokio::test]
async fn test_hand_added_annotation_preserved_without_mutation() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let mut stored = converged(&mock).await;
    stored
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert("customer-note".to_string(), "keep".to_string());
    mock.add_route(stored);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::NoAction);
    assert!(mock.mutations().is_empty());

    let rendered = reconciler.render_desired_route(&instance).await.unwrap().unwrap();
    let annotations = rendered.metadata.annotations.unwrap();
    assert_eq!(annotations.get("customer-note").map(String::as_str), Some("keep"));
    assert_eq!(annotations["haproxy.router.openshift.io/timeout"], "90s");
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn test_edited_managed_annotation_is_restored() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let mut stored = converged(&mock).await;
    stored
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert("haproxy.router.openshift.io/timeout".to_string(), "5s".to_string());
    mock.add_route(stored);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::NoAction);
    assert_eq!(mock.mutations(), vec![update_call()]);
    let route = mock.route(NS, "cp-console").unwrap();
    assert_eq!(route.metadata.annotations.unwrap()["haproxy.router.openshift.io/timeout"], "90s");
}

#[tokio::test]
async fn test_mutable_change_updates_in_place() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let mut stored = converged(&mock).await;
    let uid = stored.metadata.uid.clone();
    stored.spec.path = "/console".to_string();
    stored.spec.tls = None;
    stored.metadata.labels = None;
    mock.add_route(stored);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::NoAction);
    assert_eq!(mock.mutations(), vec![update_call()]);

    let route = mock.route(NS, "cp-console").unwrap();
    assert_eq!(route.metadata.uid, uid);
    assert_eq!(route.spec.path, "/");
    assert_eq!(route.spec.tls.unwrap().termination, TlsTermination::Reencrypt);
    assert!(route.metadata.labels.is_some());
}

#[tokio::test]
async fn test_create_race_already_exists_requeues() {
    let mock = create_mock_with_dependencies(NS, HOST);
    mock.fail_on(MockOp::CreateRoute, InjectedFailure::AlreadyExists);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let outcome = reconciler.reconcile_routes(&instance).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Requeue);
    assert_eq!(mock.mutations(), vec![create_call(HOST)]);
}

#[tokio::test]
async fn test_create_failure_is_surfaced() {
    let mock = create_mock_with_dependencies(NS, HOST);
    mock.fail_on(
        MockOp::CreateRoute,
        InjectedFailure::Status { code: 403, message: "forbidden".to_string() },
    );

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::Cluster(_)));
    assert!(err.to_string().contains("create Route ibm-common-services/cp-console"));
}

#[tokio::test]
async fn test_second_pass_is_idempotent() {
    let mock = create_mock_with_dependencies(NS, HOST);
    converged(&mock).await;

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    for _ in 0..3 {
        assert_eq!(reconciler.reconcile_routes(&instance).await.unwrap(), ReconcileOutcome::NoAction);
    }
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn test_update_conflict_is_error() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let mut stored = converged(&mock).await;
    stored.spec.path = "/console".to_string();
    mock.add_route(stored);
    mock.fail_on(MockOp::UpdateRoute, InjectedFailure::Conflict);

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::Cluster(ref e) if e.is_conflict()));

    // Next pass reads fresh state and converges
    mock.clear_failure(MockOp::UpdateRoute);
    assert_eq!(reconciler.reconcile_routes(&instance).await.unwrap(), ReconcileOutcome::NoAction);
    assert_eq!(mock.route(NS, "cp-console").unwrap().spec.path, "/");
}

#[tokio::test]
async fn test_get_route_failure_is_surfaced() {
    let mock = create_mock_with_dependencies(NS, HOST);
    mock.fail_on(
        MockOp::GetRoute,
        InjectedFailure::Status { code: 500, message: "internal error".to_string() },
    );

    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);
    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::Cluster(_)));
    assert!(mock.mutations().is_empty());
}

#[tokio::test]
async fn test_render_desired_route_without_stored_route() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let reconciler = create_test_reconciler(&mock);
    let instance = create_test_common_web_ui("example-commonwebui", NS);

    let rendered = reconciler.render_desired_route(&instance).await.unwrap().unwrap();
    assert_eq!(rendered.metadata.annotations, Some(console_annotations()));
    assert!(mock.mutations().is_empty());

    let empty = MockClusterClient::new();
    let reconciler = create_test_reconciler(&empty);
    assert!(reconciler.render_desired_route(&instance).await.unwrap().is_none());
}

#[tokio::test]
async fn test_instance_without_namespace_is_rejected() {
    let mock = create_mock_with_dependencies(NS, HOST);
    let reconciler = create_test_reconciler(&mock);
    let mut instance = create_test_common_web_ui("example-commonwebui", NS);
    instance.metadata.namespace = None;

    let err = reconciler.reconcile_routes(&instance).await.unwrap_err();

    assert!(matches!(err, ControllerError::MissingNamespace { kind: "CommonWebUI", ref name } if name == "example-commonwebui"));
    assert!(mock.calls().is_empty());
}

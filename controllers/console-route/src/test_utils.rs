//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::config::RouteSettings;
use crate::reconciler::Reconciler;
use crds::{CommonWebUI, CommonWebUISpec};
use cluster_client::MockClusterClient;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Helper to create a test CommonWebUI with a uid, as read from the API server
pub fn create_test_common_web_ui(name: &str, namespace: &str) -> CommonWebUI {
    CommonWebUI {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(format!("{}-uid", name)),
            ..Default::default()
        },
        spec: CommonWebUISpec {
            version: Some("4.6.0".to_string()),
        },
    }
}

/// Helper to create the route CA secret; `None` leaves `ca.crt` out
pub fn create_test_ca_secret(namespace: &str, ca_cert: Option<&[u8]>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(crate::config::DEFAULT_CERT_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: ca_cert.map(|cert| BTreeMap::from([("ca.crt".to_string(), ByteString(cert.to_vec()))])),
        ..Default::default()
    }
}

/// Helper to create the cluster info config map; `None` leaves `cluster_address` out
pub fn create_test_cluster_info(namespace: &str, cluster_address: Option<&str>) -> ConfigMap {
    let mut data = BTreeMap::from([("cluster_endpoint".to_string(), "https://api.example.com:6443".to_string())]);
    if let Some(address) = cluster_address {
        data.insert("cluster_address".to_string(), address.to_string());
    }
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(crate::config::DEFAULT_CLUSTER_INFO_CONFIGMAP_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

/// Helper to create a mock client with both route dependencies published
pub fn create_mock_with_dependencies(namespace: &str, cluster_address: &str) -> MockClusterClient {
    let mock = MockClusterClient::new();
    mock.add_secret(create_test_ca_secret(namespace, Some(b"CERTDATA")));
    mock.add_config_map(create_test_cluster_info(namespace, Some(cluster_address)));
    mock
}

/// Helper to create a reconciler with default settings
pub fn create_test_reconciler(mock: &MockClusterClient) -> Reconciler {
    Reconciler::new(mock.clone(), RouteSettings::default())
}

//! CommonWebUI CRD
//!
//! Parent resource for the console. Deleting it garbage-collects the route.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "operators.ibm.com",
    version = "v1alpha1",
    kind = "CommonWebUI",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct CommonWebUISpec {
    /// Console version being deployed (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

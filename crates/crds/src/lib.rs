//! Console Route CRD Definitions
//!
//! Kubernetes resource types used by the console route controller:
//! - `CommonWebUI`: the parent resource that owns the console route
//! - `Route`: the OpenShift `route.openshift.io/v1` object exposing the console

pub mod common_web_ui;
pub mod route;

pub use common_web_ui::*;
pub use route::*;

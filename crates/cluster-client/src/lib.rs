//! Cluster object store client
//!
//! Narrow client over the Kubernetes API covering exactly the objects the
//! console route controller reads and writes: the console `Route`, the CA
//! certificate `Secret` and the cluster-info `ConfigMap`.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClient, ClusterClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClusterClient::new(kube::Client::try_default().await?);
//!
//! match client.get_route("ibm-common-services", "cp-console").await {
//!     Ok(route) => println!("route host: {}", route.spec.host),
//!     Err(e) if e.is_not_found() => println!("route does not exist yet"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `test-util`: enables [`MockClusterClient`], an in-memory store that
//!   records every call and can be told to fail specific operations

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::ClusterClient;
pub use cluster_trait::ClusterClientTrait;
pub use error::{ClusterError, ObjectRef, Operation};
#[cfg(feature = "test-util")]
pub use mock::{InjectedFailure, MockClusterClient, MockOp, StoreCall};

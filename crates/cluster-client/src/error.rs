//! Cluster client errors
//!
//! Every error names the operation and the object it was aimed at so callers
//! can report failures without re-deriving context.

use std::fmt;
use thiserror::Error;

/// Store operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read by name
    Get,
    /// POST of a new object
    Create,
    /// Full replace guarded by resourceVersion
    Update,
    /// Delete by name
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Identity of the object an operation targeted (`Kind namespace/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Kubernetes kind, e.g. `Route`
    pub kind: &'static str,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    /// Builds a reference from its parts
    pub fn new(kind: &'static str, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Errors that can occur when talking to the cluster object store
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Object does not exist
    #[error("{target} not found")]
    NotFound { target: ObjectRef },

    /// Create raced with another writer that created the object first
    #[error("{target} already exists")]
    AlreadyExists { target: ObjectRef },

    /// Write was based on a stale resourceVersion
    #[error("{operation} {target} rejected: object was modified concurrently")]
    Conflict { operation: Operation, target: ObjectRef },

    /// API server rejected the request
    #[error("{operation} {target} failed with status {code}: {message}")]
    Api {
        operation: Operation,
        target: ObjectRef,
        code: u16,
        message: String,
    },

    /// Request never produced an API status (connection, TLS, decoding, ...)
    #[error("{operation} {target} failed: {source}")]
    Transport {
        operation: Operation,
        target: ObjectRef,
        #[source]
        source: kube::Error,
    },

    /// Object handed to the client lacks the metadata needed to address it
    #[error("cannot {operation} {kind}: {reason}")]
    InvalidObject {
        operation: Operation,
        kind: &'static str,
        reason: String,
    },
}

impl ClusterError {
    /// Maps an API status code to an error, taking the operation into account:
    /// a 409 on create means another writer won the race, on update it means
    /// the write was based on a stale read.
    pub fn from_status(operation: Operation, target: ObjectRef, code: u16, message: impl Into<String>) -> Self {
        match (code, operation) {
            (404, _) => ClusterError::NotFound { target },
            (409, Operation::Create) => ClusterError::AlreadyExists { target },
            (409, _) => ClusterError::Conflict { operation, target },
            _ => ClusterError::Api {
                operation,
                target,
                code,
                message: message.into(),
            },
        }
    }

    pub(crate) fn from_kube(operation: Operation, target: ObjectRef, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => {
                Self::from_status(operation, target, response.code, response.message.clone())
            }
            source => ClusterError::Transport {
                operation,
                target,
                source,
            },
        }
    }

    /// The target object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }

    /// A create lost the race to another writer
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists { .. })
    }

    /// A write was rejected because it was based on a stale read
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict { .. })
    }
}

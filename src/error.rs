//! Error types
//!
//! Two families of errors live here. `TreeError` covers caller contract
//! violations against the tree and forest construction; these indicate a bug
//! and are never retried. `ApiError` covers operational failures of a running
//! daemon: configuration, filesystem, watcher, provider and cancellation.

use crate::tree::NodeId;
use thiserror::Error;

/// Structural contract violations raised by [`crate::tree::Forest`] and
/// [`crate::tree::create_forest`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("insertion index {index} is outside 0..={len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("node {0} can not be added because it is not a root node")]
    NotARoot(NodeId),

    #[error("node {0} is the root node of the target")]
    RootOfTarget(NodeId),

    #[error("node {0} can not be added to itself or its descendants")]
    Cycle(NodeId),

    #[error("root node {0} can not be disconnected from a parent")]
    DisconnectRoot(NodeId),

    #[error("node {0} already has a parent")]
    AlreadyParented(NodeId),

    #[error("node {0} has no parent to add a sibling to")]
    NoParent(NodeId),

    #[error("value [{0}] has the same id and parent id")]
    SelfParent(String),

    #[error("{count} values share a key, the first duplicate is [{first}]")]
    DuplicateKey { count: usize, first: String },

    #[error("value [{id}] has the parent id [{parent}] but no other value has this id")]
    DanglingParent { id: String, parent: String },
}

/// Operational errors surfaced by the daemon and its collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("tree contract violated: {0}")]
    Tree(#[from] TreeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watcher error: {0}")]
    WatchError(String),

    #[error("provider error: {0}")]
    ProviderError(String),

    #[error("provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// True when the error points at a bug rather than a transient failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ApiError::Tree(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(e: config::ConfigError) -> Self {
        ApiError::ConfigError(e.to_string())
    }
}

impl From<notify::Error> for ApiError {
    fn from(e: notify::Error) -> Self {
        ApiError::WatchError(e.to_string())
    }
}

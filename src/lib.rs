//! Beholder: Filesystem Changes to CDN Operations
//!
//! Watches a directory tree and turns change events into deduplicated,
//! hierarchically pruned refresh and preload requests against an edge cache.
//! Producers record paths in a gated [`store::PathStore`]; a periodic
//! [`dispatch::DispatchWorker`] drains it into trees, prunes them and hands
//! the survivors to a [`provider::CacheHandler`].

pub mod config;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod provider;
pub mod pruning;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod watch;

pub use config::BeholderConfig;
pub use error::{ApiError, TreeError};
pub use store::{PathEntry, PathStore, PathTree, Snapshot};
pub use types::Category;

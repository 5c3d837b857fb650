//! Config composition

pub mod policy;
pub mod service;

pub use service::MergeService;

//! Integration tests for the watch, store, prune and dispatch pipeline

mod concurrency;
mod drain_cycle;
mod support;
mod watch_runtime;

//! Threshold-based directory collapse with an optional preload existence check

use super::Pruner;
use crate::config::PruningConfig;
use crate::error::ApiError;
use crate::store::PathTree;
use crate::tree::NodeId;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimplePruning {
    merge_threshold: usize,
    preload_check_root: Option<PathBuf>,
}

impl SimplePruning {
    pub fn new(merge_threshold: usize, preload_check_root: Option<PathBuf>) -> Self {
        Self {
            merge_threshold,
            preload_check_root,
        }
    }

    pub fn from_config(config: &PruningConfig) -> Self {
        let root = if config.preload_check_root.is_empty() {
            None
        } else {
            Some(PathBuf::from(&config.preload_check_root))
        };
        Self::new(config.merge_threshold, root)
    }

    /// Drop preload files that vanished, and refresh nodes made redundant by
    /// a fresh preload of the same file.
    fn prune_preload(
        &self,
        check_root: &Path,
        refresh: &mut PathTree,
        preload: &mut PathTree,
    ) -> Result<(), ApiError> {
        let refresh_index = refresh.path_index();
        let files: Vec<_> = preload
            .all()
            .filter(|&id| !preload.forest().value(id).is_directory)
            .collect();

        for id in files {
            let entry = preload.forest().value(id).clone();

            if entry.just_created {
                if let Some(&twin) = refresh_index.get(&entry.path) {
                    if twin != refresh.root() && !refresh.forest().is_root(twin) {
                        info!(path = %entry.path, "Pruned refresh of just created file");
                        refresh.forest_mut().disconnect(twin)?;
                    }
                }
            }

            if !file_exists(check_root, &entry.path)? && !preload.forest().is_root(id) {
                info!(path = %entry.path, "Pruned preload of missing file");
                preload.forest_mut().disconnect(id)?;
            }
        }
        Ok(())
    }

    /// Collapse directories at or over the threshold, and any directory
    /// already forced, into one directory-level operation.
    fn merge_refresh(&self, refresh: &mut PathTree, order: Vec<NodeId>) -> Result<(), ApiError> {
        for id in order {
            if !refresh.is_attached(id) {
                continue;
            }
            let child_count = refresh.forest().children(id).len();
            let entry = refresh.forest_mut().value_mut(id);
            if !entry.is_directory {
                continue;
            }
            entry.will_force_update =
                entry.will_force_update || child_count >= self.merge_threshold;
            if !entry.will_force_update || child_count == 0 {
                continue;
            }

            info!(path = %entry.path, children = child_count, "Pruned directory children");
            let children = refresh.forest().children(id).to_vec();
            for child in children {
                refresh.forest_mut().disconnect(child)?;
            }
        }
        Ok(())
    }
}

impl Pruner for SimplePruning {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn prune(&self, refresh: &mut PathTree, preload: &mut PathTree) -> Result<(), ApiError> {
        let order: Vec<_> = refresh.all().collect();

        if let Some(root) = &self.preload_check_root {
            self.prune_preload(root, refresh, preload)?;
        }
        self.merge_refresh(refresh, order)?;

        debug!(
            refresh = refresh.len(),
            preload = preload.len(),
            "Pruning finished"
        );
        Ok(())
    }
}

/// Whether `path` names a regular file under `root`; only `NotFound` counts
/// as missing
fn file_exists(root: &Path, path: &str) -> Result<bool, ApiError> {
    let relative = path.trim_start_matches('/');
    match std::fs::metadata(root.join(relative)) {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ApiError::Io(e)),
    }
}

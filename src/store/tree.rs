//! Materialized drain batches

use super::entry::{PathEntry, ROOT_PATH};
use crate::tree::{Descendants, Forest, NodeId};
use std::collections::HashMap;

/// A single-rooted forest of path entries produced by a drain
#[derive(Debug, Clone)]
pub struct PathTree {
    forest: Forest<PathEntry>,
    root: NodeId,
}

impl PathTree {
    pub(crate) fn new(forest: Forest<PathEntry>, root: NodeId) -> Self {
        Self { forest, root }
    }

    /// Root-only tree, used in place of a category that drained nothing
    pub fn empty() -> Self {
        let mut forest = Forest::with_capacity(1);
        let root = forest.insert(PathEntry::root());
        Self { forest, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn forest(&self) -> &Forest<PathEntry> {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut Forest<PathEntry> {
        &mut self.forest
    }

    /// Every node still attached under the root, pre-order, root included
    pub fn all(&self) -> Descendants<'_, PathEntry> {
        self.forest.self_and_descendants(self.root)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> + '_ {
        self.all().map(move |id| self.forest.value(id))
    }

    /// Attached entries that carry an operation. The root only does so once
    /// it has been forced.
    pub fn operations(&self) -> Vec<PathEntry> {
        self.entries()
            .filter(|e| !e.is_root() || e.will_force_update)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.all().count()
    }

    /// True when nothing but the root is attached
    pub fn is_empty(&self) -> bool {
        self.forest.children(self.root).is_empty()
    }

    /// Node holding `path`, if it is still attached under the root
    pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
        if path == ROOT_PATH {
            return Some(self.root);
        }
        self.all().find(|&id| self.forest.value(id).path == path)
    }

    /// Index of attached nodes by path
    pub fn path_index(&self) -> HashMap<String, NodeId> {
        self.all()
            .map(|id| (self.forest.value(id).path.clone(), id))
            .collect()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.forest.root(id) == self.root
    }
}

/// Result of a successful drain of one category
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: PathTree,
    /// Store keys that were materialized; synthesized ancestors are absent
    pub taken: Vec<String>,
}

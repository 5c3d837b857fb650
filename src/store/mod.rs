//! Path Store
//!
//! Accumulates pending refresh and preload operations keyed by normalized
//! path. Producers add paths through the gate; the consumer closes the gate,
//! materializes a bounded batch into a [`PathTree`], clears exactly what it
//! took and reopens the gate.

pub mod entry;
pub mod gate;
pub mod tree;

pub use entry::{normalize_path, PathEntry, ROOT_PATH};
pub use gate::Gate;
pub use tree::{PathTree, Snapshot};

use crate::error::{ApiError, TreeError};
use crate::tree::create_forest;
use crate::types::Category;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

type EntryMap = IndexMap<String, PathEntry>;

/// Two insertion-ordered path maps sharing one producer gate
#[derive(Debug, Default)]
pub struct PathStore {
    refresh: RwLock<EntryMap>,
    preload: RwLock<EntryMap>,
    gate: Gate,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, category: Category) -> &RwLock<EntryMap> {
        match category {
            Category::Refresh => &self.refresh,
            Category::Preload => &self.preload,
        }
    }

    /// Record a path and every missing ancestor directory.
    ///
    /// Existing ancestors are left untouched. A repeated add of the same path
    /// only ORs `force_update` into the stored entry.
    pub fn add_path(
        &self,
        category: Category,
        full_path: &str,
        is_directory: bool,
        force_update: bool,
        just_created: bool,
    ) {
        let path = normalize_path(full_path);
        let mut map = self.map(category).write();

        if path == ROOT_PATH {
            map.entry(path)
                .and_modify(|e| e.merge_force_update(force_update))
                .or_insert_with(|| PathEntry::root().with_force_update(force_update));
            return;
        }

        for (ancestor, parent) in entry::ancestors_of(&path) {
            if !map.contains_key(&ancestor) {
                let dir = PathEntry::ancestor(ancestor.clone(), parent);
                map.insert(ancestor, dir);
            }
        }

        match map.get_mut(&path) {
            Some(existing) => existing.merge_force_update(force_update),
            None => {
                let parent = entry::parent_of(&path);
                let leaf = PathEntry::new(path.clone(), parent, is_directory)
                    .with_force_update(force_update)
                    .with_just_created(just_created);
                map.insert(path.clone(), leaf);
            }
        }

        trace!(
            category = %category,
            path = %path,
            is_directory,
            force_update,
            just_created,
            "Path recorded"
        );
    }

    /// Wait for the gate, then record the path. Cancellation leaves the
    /// store untouched.
    pub async fn add_path_gated(
        &self,
        category: Category,
        full_path: &str,
        is_directory: bool,
        force_update: bool,
        just_created: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.gate.wait(cancel).await?;
        self.add_path(category, full_path, is_directory, force_update, just_created);
        Ok(())
    }

    pub fn exists(&self, category: Category, full_path: &str) -> bool {
        let path = normalize_path(full_path);
        self.map(category).read().contains_key(&path)
    }

    pub fn get(&self, category: Category, full_path: &str) -> Option<PathEntry> {
        let path = normalize_path(full_path);
        self.map(category).read().get(&path).cloned()
    }

    pub fn len(&self, category: Category) -> usize {
        self.map(category).read().len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.map(category).read().is_empty()
    }

    /// Materialize up to `take_count` entries, in insertion order, into a
    /// single-rooted tree. Does not clear anything.
    ///
    /// Ancestors missing from the window are pulled in from the store when
    /// present, otherwise synthesized as plain directories. Returns `None`
    /// for a non-positive `take_count`, an empty store or a batch that does
    /// not link into exactly one root.
    pub fn snapshot(
        &self,
        category: Category,
        take_count: i64,
    ) -> Result<Option<Snapshot>, TreeError> {
        let Some(take) = take_window(category, take_count) else {
            return Ok(None);
        };
        let map = self.map(category).read();
        materialize(&map, category, take)
    }

    /// Materialize a batch like [`PathStore::snapshot`] and remove its
    /// `taken` keys under the same write lock, so no merge can land between
    /// the two steps and be lost.
    pub fn snapshot_and_clear(
        &self,
        category: Category,
        take_count: i64,
    ) -> Result<Option<Snapshot>, TreeError> {
        let Some(take) = take_window(category, take_count) else {
            return Ok(None);
        };
        let mut map = self.map(category).write();
        let snapshot = materialize(&map, category, take)?;
        if let Some(snapshot) = &snapshot {
            remove_keys(&mut map, category, &snapshot.taken);
        }
        Ok(snapshot)
    }

    /// Remove exactly the listed keys, keeping the order of the rest
    pub fn clear(&self, category: Category, paths: &[String]) {
        if paths.is_empty() {
            return;
        }
        let mut map = self.map(category).write();
        remove_keys(&mut map, category, paths);
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Close the gate for a drain; it reopens when the guard is released or dropped
    pub fn block(&self) -> DrainGuard<'_> {
        self.gate.block();
        DrainGuard {
            gate: &self.gate,
            released: false,
        }
    }

    pub fn release(&self) {
        self.gate.release();
    }

    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.gate.wait(cancel).await
    }
}

/// Keeps the producer gate closed while alive
#[must_use = "dropping the guard reopens the gate immediately"]
pub struct DrainGuard<'a> {
    gate: &'a Gate,
    released: bool,
}

impl DrainGuard<'_> {
    pub fn release(mut self) {
        self.reopen();
    }

    fn reopen(&mut self) {
        if !self.released {
            self.released = true;
            self.gate.release();
        }
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.reopen();
    }
}

fn take_window(category: Category, take_count: i64) -> Option<usize> {
    if take_count < 1 {
        warn!(category = %category, take_count, "Take count is not positive, nothing drained");
        return None;
    }
    Some(usize::try_from(take_count).unwrap_or(usize::MAX))
}

fn materialize(
    map: &EntryMap,
    category: Category,
    take: usize,
) -> Result<Option<Snapshot>, TreeError> {
    if map.is_empty() {
        return Ok(None);
    }

    let mut batch: IndexMap<String, PathEntry> = IndexMap::new();
    let mut taken: Vec<String> = Vec::new();
    let window: HashSet<&str> = map.keys().take(take).map(String::as_str).collect();

    let root = match map.get(ROOT_PATH) {
        Some(stored) => {
            taken.push(ROOT_PATH.to_string());
            stored.clone()
        }
        None => PathEntry::root(),
    };
    batch.insert(ROOT_PATH.to_string(), root);

    for (path, entry) in map.iter().take(take) {
        if path == ROOT_PATH {
            continue;
        }
        for (ancestor, parent) in entry::ancestors_of(path) {
            if batch.contains_key(&ancestor) {
                continue;
            }
            let pulled = match map.get(&ancestor) {
                Some(stored) => {
                    if !window.contains(ancestor.as_str()) {
                        taken.push(ancestor.clone());
                    }
                    stored.clone()
                }
                None => PathEntry::ancestor(ancestor.clone(), parent),
            };
            batch.insert(ancestor, pulled);
        }
        if !batch.contains_key(path) {
            taken.push(path.clone());
            batch.insert(path.clone(), entry.clone());
        } else if window.contains(path.as_str()) && !taken.contains(path) {
            taken.push(path.clone());
        }
    }

    let (forest, roots) = create_forest(
        batch.into_values(),
        |e| e.path.clone(),
        |e| e.parent_path.clone(),
    )?;

    if roots.len() != 1 {
        warn!(category = %category, roots = roots.len(), "Drained batch has no single root");
        return Ok(None);
    }

    debug!(category = %category, taken = taken.len(), nodes = forest.len(), "Snapshot materialized");
    Ok(Some(Snapshot {
        tree: PathTree::new(forest, roots[0]),
        taken,
    }))
}

fn remove_keys(map: &mut EntryMap, category: Category, paths: &[String]) {
    let doomed: HashSet<&str> = paths.iter().map(String::as_str).collect();
    let before = map.len();
    map.retain(|path, _| !doomed.contains(path.as_str()));
    debug!(category = %category, removed = before - map.len(), "Store cleared");
}

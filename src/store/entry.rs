//! Path entries and path key normalization

use serde::Serialize;
use std::hash::{Hash, Hasher};
use unicode_normalization::UnicodeNormalization;

/// Key of the synthetic root every drained tree hangs off
pub const ROOT_PATH: &str = "";

/// A pending path operation. Identity is the path alone.
#[derive(Debug, Clone, Serialize)]
pub struct PathEntry {
    /// Normalized full path, unique within a category
    pub path: String,
    /// `None` only for the root entry
    pub parent_path: Option<String>,
    pub is_directory: bool,
    /// Sticky once set: merges only ever OR this flag
    pub will_force_update: bool,
    pub just_created: bool,
}

impl PathEntry {
    pub fn new(path: impl Into<String>, parent_path: Option<String>, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            parent_path,
            is_directory,
            will_force_update: false,
            just_created: false,
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_PATH, None, true)
    }

    /// Plain directory entry for an ancestor segment of some other path
    pub fn ancestor(path: impl Into<String>, parent_path: impl Into<String>) -> Self {
        Self::new(path, Some(parent_path.into()), true)
    }

    pub fn with_force_update(mut self, force: bool) -> Self {
        self.will_force_update = force;
        self
    }

    pub fn with_just_created(mut self, just_created: bool) -> Self {
        self.just_created = just_created;
        self
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_PATH
    }

    /// Fold a repeated add of the same path into this entry
    pub fn merge_force_update(&mut self, force: bool) {
        self.will_force_update = self.will_force_update || force;
    }
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for PathEntry {}

impl Hash for PathEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl std::fmt::Display for PathEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Normalize a raw path into a store key.
///
/// Backslashes become `/`, empty segments are dropped and each segment is put
/// in NFC form. Non-empty results are rooted (`/a/b`); the root itself is `""`.
pub fn normalize_path(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len() + 1);
    for segment in raw.split(['/', '\\']).filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.extend(segment.nfc());
    }
    normalized
}

/// Ancestor keys of a normalized path paired with their parents, outermost first.
///
/// `/a/b/c.txt` yields `("/a", "")` then `("/a/b", "/a")`.
pub fn ancestors_of(path: &str) -> Vec<(String, String)> {
    let mut result = Vec::new();
    if path.is_empty() {
        return result;
    }
    let mut parent = ROOT_PATH.to_string();
    let mut cursor = 0;
    while let Some(offset) = path[cursor + 1..].find('/') {
        let end = cursor + 1 + offset;
        let current = path[..end].to_string();
        result.push((current.clone(), parent));
        parent = current;
        cursor = end;
    }
    result
}

/// Parent key of a normalized path; `None` for the root
pub fn parent_of(path: &str) -> Option<String> {
    if path == ROOT_PATH {
        return None;
    }
    match path.rfind('/') {
        Some(0) | None => Some(ROOT_PATH.to_string()),
        Some(i) => Some(path[..i].to_string()),
    }
}

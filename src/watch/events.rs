//! Change events and producer-side filtering

use crate::config::WatchConfig;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};
use std::path::{Path, PathBuf};

/// Event kinds, one producer task each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Changed,
    Deleted,
    Renamed,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Created,
        ChangeKind::Changed,
        ChangeKind::Deleted,
        ChangeKind::Renamed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Changed => "changed",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }

    /// Whether the watch config asks for this kind
    pub fn enabled_in(self, config: &WatchConfig) -> bool {
        match self {
            ChangeKind::Created => config.on_created,
            ChangeKind::Changed => config.on_changed,
            ChangeKind::Deleted => config.on_deleted,
            ChangeKind::Renamed => config.on_renamed,
        }
    }
}

/// Filesystem change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created { path: PathBuf, is_dir: bool },
    Changed { path: PathBuf, is_dir: bool },
    Deleted { path: PathBuf, is_dir: bool },
    Renamed { from: PathBuf, to: PathBuf, is_dir: bool },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Created { .. } => ChangeKind::Created,
            ChangeEvent::Changed { .. } => ChangeKind::Changed,
            ChangeEvent::Deleted { .. } => ChangeKind::Deleted,
            ChangeEvent::Renamed { .. } => ChangeKind::Renamed,
        }
    }

    /// Path the event is reported at; the new path for a rename
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created { path, .. }
            | ChangeEvent::Changed { path, .. }
            | ChangeEvent::Deleted { path, .. } => path,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }

    pub fn is_dir(&self) -> bool {
        match self {
            ChangeEvent::Created { is_dir, .. }
            | ChangeEvent::Changed { is_dir, .. }
            | ChangeEvent::Deleted { is_dir, .. }
            | ChangeEvent::Renamed { is_dir, .. } => *is_dir,
        }
    }
}

/// Translate a raw notify event. Metadata-only changes and access events
/// are dropped.
pub fn convert_event(event: Event) -> Option<ChangeEvent> {
    let mut paths = event.paths.into_iter();
    match event.kind {
        EventKind::Create(kind) => {
            let path = paths.next()?;
            let is_dir = match kind {
                CreateKind::Folder => true,
                CreateKind::File => false,
                _ => path.is_dir(),
            };
            Some(ChangeEvent::Created { path, is_dir })
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let from = paths.next()?;
            let to = paths.next()?;
            let is_dir = to.is_dir();
            Some(ChangeEvent::Renamed { from, to, is_dir })
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            let path = paths.next()?;
            Some(ChangeEvent::Deleted {
                is_dir: path.is_dir(),
                path,
            })
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            let path = paths.next()?;
            Some(ChangeEvent::Created {
                is_dir: path.is_dir(),
                path,
            })
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => {
            let path = paths.next()?;
            Some(ChangeEvent::Changed {
                is_dir: path.is_dir(),
                path,
            })
        }
        EventKind::Remove(kind) => {
            let path = paths.next()?;
            let is_dir = matches!(kind, RemoveKind::Folder);
            Some(ChangeEvent::Deleted { path, is_dir })
        }
        _ => None,
    }
}

/// Exclusion lists and prefix trimming from the watch config
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    exclude_extensions: Vec<String>,
    exclude_paths: Vec<String>,
    trim_start: String,
}

impl EventFilter {
    pub fn new(
        exclude_extensions: &[String],
        exclude_paths: &[String],
        trim_start: impl Into<String>,
    ) -> Self {
        Self {
            exclude_extensions: exclude_extensions.iter().map(|e| e.to_lowercase()).collect(),
            exclude_paths: exclude_paths.iter().map(|p| p.to_lowercase()).collect(),
            trim_start: trim_start.into(),
        }
    }

    /// Filter for a watcher reporting canonical paths. `trim_start` and
    /// `exclude_paths` entries naming existing paths are canonicalized the
    /// same way as the watch directory; the rest are used as written.
    pub fn from_config(config: &WatchConfig) -> Self {
        let exclude_paths: Vec<String> = config
            .exclude_paths
            .iter()
            .map(|p| canonical_prefix(p))
            .collect();
        Self::new(
            &config.exclude_extensions,
            &exclude_paths,
            canonical_prefix(&config.trim_start),
        )
    }

    /// Excluded by extension (with its dot, any case) or by path prefix
    pub fn is_excluded(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext = format!(".{}", ext.to_string_lossy()).to_lowercase();
            if self.exclude_extensions.contains(&ext) {
                return true;
            }
        }
        let full = path.to_string_lossy().to_lowercase();
        self.exclude_paths.iter().any(|p| full.starts_with(p.as_str()))
    }

    /// Strip the configured prefix when the path is strictly longer than it
    pub fn trim(&self, path: &Path) -> String {
        let full = path.to_string_lossy();
        match full.strip_prefix(self.trim_start.as_str()) {
            Some(rest) if !self.trim_start.is_empty() && !rest.is_empty() => rest.to_string(),
            _ => full.into_owned(),
        }
    }
}

/// Canonical form of a configured path prefix, keeping a trailing separator
fn canonical_prefix(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match dunce::canonicalize(raw) {
        Ok(canonical) => {
            let mut prefix = canonical.to_string_lossy().into_owned();
            if raw.ends_with(['/', '\\']) && !prefix.ends_with(std::path::MAIN_SEPARATOR) {
                prefix.push(std::path::MAIN_SEPARATOR);
            }
            prefix
        }
        Err(_) => raw.to_string(),
    }
}

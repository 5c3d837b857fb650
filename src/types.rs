//! Core types shared across the store, producer and consumer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Intent category of a pending path operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Invalidate the edge copy
    Refresh,
    /// Warm the edge copy
    Preload,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Refresh, Category::Preload];

    pub fn from_refresh(is_refresh: bool) -> Self {
        if is_refresh {
            Category::Refresh
        } else {
            Category::Preload
        }
    }

    pub fn is_refresh(self) -> bool {
        self == Category::Refresh
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Refresh => "refresh",
            Category::Preload => "preload",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

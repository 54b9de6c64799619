//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the engine keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreLocation {
    /// A database file on disk, created on first open.
    Disk(PathBuf),
    /// A private in-memory database, discarded on drop.
    InMemory,
}

/// Configuration for opening an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where record data lives.
    pub location: StoreLocation,
    /// How long a writer waits on a locked database before giving up, in
    /// milliseconds.
    pub busy_timeout_ms: u32,
}

impl EngineConfig {
    /// Creates a config storing data at the given path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::Disk(path.into()),
            ..Self::default()
        }
    }

    /// Creates a config for an in-memory engine.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            ..Self::default()
        }
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.busy_timeout_ms = timeout_ms;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Disk(PathBuf::from("tabula.db")),
            busy_timeout_ms: 5000,
        }
    }
}

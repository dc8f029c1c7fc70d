//! Removable storage presence probes.
//!
//! The logger never assumes its backing medium is there. All it asks of the
//! host is a presence probe and a mount root; the lifecycle state machine
//! polls the probe once per health-check tick and reacts to insertions and
//! removals.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// A removable storage medium that may appear and disappear at runtime.
pub trait StorageMedium: Send + Sync {
    /// Whether the medium is currently inserted and mounted.
    fn is_present(&self) -> bool;

    /// Root directory under which log files and the index record live.
    fn root(&self) -> &Path;
}

/// Storage backed by a mount directory, present whenever the directory
/// exists.
///
/// On the target this is the SD-card mount point; in tests it is usually a
/// tempdir.
#[derive(Debug)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Creates a probe for the given mount directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StorageMedium for DirStorage {
    fn is_present(&self) -> bool {
        self.root.is_dir()
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// Storage whose presence is toggled programmatically.
///
/// Used by tests and simulation to exercise removal and reinsertion without
/// touching the filesystem state underneath.
#[derive(Debug)]
pub struct SwitchableStorage {
    root: PathBuf,
    present: AtomicBool,
}

impl SwitchableStorage {
    /// Creates a probe over `root`, initially present.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            present: AtomicBool::new(true),
        }
    }

    /// Simulates inserting the medium.
    pub fn insert(&self) {
        self.present.store(true, Ordering::SeqCst);
    }

    /// Simulates removing the medium.
    pub fn remove(&self) {
        self.present.store(false, Ordering::SeqCst);
    }
}

impl StorageMedium for SwitchableStorage {
    fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

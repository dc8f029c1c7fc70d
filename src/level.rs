//! Log severity levels and the per-source level registry.
//!
//! Every message carries a [`Level`] and a source identifier (by convention
//! the originating module path). The [`LevelRegistry`] maps each source to
//! the minimum level it must meet to pass the filter. Entries are created
//! lazily on first sight of a source and are never removed, so the registry
//! only grows, bounded by the number of distinct call sites in the program.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Message severity, ordered from least to most severe.
///
/// `Always` is special: it bypasses the registry check entirely and is never
/// filtered, regardless of the source's configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose diagnostics, filtered by default.
    Debug,
    /// Routine progress information, filtered by default.
    Info,
    /// Unexpected but recoverable conditions. The default minimum.
    Warn,
    /// Component malfunction, may affect data quality.
    Error,
    /// Unconditional; bypasses the level filter.
    Always,
}

impl Level {
    /// Default minimum level for sources never explicitly configured.
    pub const DEFAULT: Level = Level::Warn;

    /// Upper-case name as it appears in the message header.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Always => "ALWAYS",
        }
    }

    /// Converts a raw numeric level, clamping out-of-range values to the
    /// maximum defined severity.
    pub fn from_index(raw: u8) -> Level {
        match raw {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warn,
            3 => Level::Error,
            _ => Level::Always,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered map from source identifier to minimum log level.
///
/// Backed by a sorted `Vec` with binary search: lookup is O(log n), insertion
/// pays an O(n) shift. Distinct sources are bounded by the number of call
/// sites and each registers at most once per process lifetime, so the shift
/// cost is paid rarely.
///
/// The registry itself is not synchronized; [`LoggerContext`]
/// (crate::LoggerContext) wraps it in a mutex because first-use registration
/// can race between the fast and slow tasks.
#[derive(Debug)]
pub struct LevelRegistry {
    entries: Vec<(String, Level)>,
    default: Level,
}

impl LevelRegistry {
    /// Creates an empty registry with the given default minimum level.
    pub fn new(default: Level) -> Self {
        Self {
            entries: Vec::new(),
            default,
        }
    }

    /// Returns the minimum level for `source`, inserting the default on
    /// first sight.
    pub fn get_or_create(&mut self, source: &str) -> Level {
        match self.lookup(source) {
            Ok(i) => self.entries[i].1,
            Err(i) => {
                self.entries.insert(i, (source.to_owned(), self.default));
                self.default
            }
        }
    }

    /// Sets the minimum level for `source`, seeding a new entry if the
    /// source has never been seen.
    pub fn set_level(&mut self, source: &str, level: Level) {
        match self.lookup(source) {
            Ok(i) => self.entries[i].1 = level,
            Err(i) => self.entries.insert(i, (source.to_owned(), level)),
        }
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no source has registered yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, source: &str) -> std::result::Result<usize, usize> {
        self.entries
            .binary_search_by(|(name, _)| name.as_str().cmp(source))
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new(Level::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Always);
    }

    #[test]
    fn test_from_index_clamps_out_of_range() {
        assert_eq!(Level::from_index(0), Level::Debug);
        assert_eq!(Level::from_index(3), Level::Error);
        assert_eq!(Level::from_index(4), Level::Always);
        assert_eq!(Level::from_index(200), Level::Always);
    }

    #[test]
    fn test_get_or_create_defaults_to_warn() {
        let mut registry = LevelRegistry::default();
        assert_eq!(registry.get_or_create("robot::drive"), Level::Warn);
        // Second lookup hits the existing entry.
        assert_eq!(registry.get_or_create("robot::drive"), Level::Warn);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_level_does_not_affect_other_sources() {
        let mut registry = LevelRegistry::default();
        registry.set_level("robot::drive", Level::Debug);
        assert_eq!(registry.get_or_create("robot::drive"), Level::Debug);
        assert_eq!(registry.get_or_create("robot::intake"), Level::Warn);
    }

    #[test]
    fn test_entries_stay_sorted() {
        let mut registry = LevelRegistry::default();
        registry.get_or_create("c");
        registry.get_or_create("a");
        registry.get_or_create("b");
        registry.set_level("a", Level::Error);
        assert_eq!(registry.get_or_create("a"), Level::Error);
        assert_eq!(registry.get_or_create("b"), Level::Warn);
        assert_eq!(registry.len(), 3);
    }
}

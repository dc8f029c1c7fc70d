//! Numbered log sessions and the persisted index record.
//!
//! A session is one `(log<N>.txt, data<N>.csv)` file pair. `N` is a
//! monotonically increasing integer whose last used value is persisted as
//! plain text in an index record at the storage root; each new session reads
//! the record, increments, and writes the chosen index back before opening
//! its files. A missing or unreadable record restarts the count at zero
//! rather than failing session creation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LogError;

/// One numbered (message-log, data-log) file pair.
///
/// Immutable once created; a rotation or segment supersedes it with the next
/// session rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Monotonically increasing session number.
    pub index: u32,
    /// Path of the human-readable message log, `log<index>.txt`.
    pub message_path: PathBuf,
    /// Path of the tabular CSV log, `data<index>.csv`.
    pub data_path: PathBuf,
}

impl Session {
    /// Derives the file pair for `index` under `root`.
    ///
    /// Indices are zero-padded to six digits so the files sort correctly in
    /// a directory listing.
    pub fn new(root: &Path, index: u32) -> Self {
        Self {
            index,
            message_path: root.join(format!("log{index:06}.txt")),
            data_path: root.join(format!("data{index:06}.csv")),
        }
    }
}

/// Determines the next session index from the persisted record.
///
/// A readable record containing integer `N` yields `N + 1`. A missing record
/// yields `0` silently (first boot on this medium). A record that exists but
/// cannot be read or decoded also yields `0`, with the failure reported so it
/// reaches the always-available sink.
pub fn next_index(index_path: &Path) -> (u32, Option<LogError>) {
    if !index_path.exists() {
        return (0, None);
    }
    match fs::read_to_string(index_path) {
        Ok(text) => match text.trim().parse::<u32>() {
            Ok(previous) => (previous + 1, None),
            Err(err) => (
                0,
                Some(LogError::IndexRead {
                    path: index_path.to_path_buf(),
                    reason: err.to_string(),
                }),
            ),
        },
        Err(err) => (
            0,
            Some(LogError::IndexRead {
                path: index_path.to_path_buf(),
                reason: err.to_string(),
            }),
        ),
    }
}

/// Writes `index` back to the persisted record.
pub fn persist_index(index_path: &Path, index: u32) -> Result<(), LogError> {
    fs::write(index_path, index.to_string()).map_err(|source| LogError::IndexWrite {
        path: index_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_zero_padded() {
        let session = Session::new(Path::new("/usd"), 7);
        assert_eq!(session.message_path, Path::new("/usd/log000007.txt"));
        assert_eq!(session.data_path, Path::new("/usd/data000007.csv"));
    }

    #[test]
    fn test_missing_index_record_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let (index, error) = next_index(&dir.path().join("index.txt"));
        assert_eq!(index, 0);
        assert!(error.is_none());
    }

    #[test]
    fn test_index_round_trip_increments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.txt");
        persist_index(&path, 41).unwrap();
        let (index, error) = next_index(&path);
        assert_eq!(index, 42);
        assert!(error.is_none());
        persist_index(&path, index).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "42");
    }

    #[test]
    fn test_garbage_index_record_resets_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.txt");
        fs::write(&path, "not-a-number").unwrap();
        let (index, error) = next_index(&path);
        assert_eq!(index, 0);
        assert!(matches!(error, Some(LogError::IndexRead { .. })));
    }
}

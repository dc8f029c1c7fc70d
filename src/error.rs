//! Error types for the logging subsystem.
//!
//! The error taxonomy mirrors the failure semantics of the logger: nothing in
//! this crate escalates a storage failure to the caller of a logging call.
//! Failures degrade the affected sink to "unavailable" and are reported at
//! [`Level::Error`](crate::Level::Error) on the always-available console sink;
//! the next health-check tick retries. Only constructors and configuration
//! loading return [`Result`] to the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results using the logger error type.
pub type Result<T> = std::result::Result<T, LogError>;

/// Primary error type for the telemetry logger.
#[derive(Error, Debug)]
pub enum LogError {
    /// A log or data file could not be created or reopened.
    ///
    /// Degrades the affected handle to invalid; the session proceeds with
    /// whatever handles did open.
    #[error("failed to open {}: {}", path.display(), source)]
    Open {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The session index record existed but could not be read or decoded.
    ///
    /// Treated as "no prior session": the index restarts at zero.
    #[error("failed to read session index from {}: {}", path.display(), reason)]
    IndexRead {
        /// Path of the index record.
        path: PathBuf,
        /// Why the read was rejected.
        reason: String,
    },

    /// The session index record could not be written back.
    ///
    /// The session proceeds using the computed index; a later restart may
    /// reuse the same index.
    #[error("failed to persist session index to {}: {}", path.display(), source)]
    IndexWrite {
        /// Path of the index record.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The per-tick field sequence deviated from the one captured at session
    /// start, which would silently misalign CSV columns.
    #[error("data column order changed: expected [{expected}], got [{actual}]")]
    ColumnOrder {
        /// Comma-joined field names captured at session start.
        expected: String,
        /// Comma-joined field names of the offending tick.
        actual: String,
    },

    /// The logger configuration was syntactically or semantically invalid.
    #[error("invalid logger configuration: {0}")]
    Config(String),

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

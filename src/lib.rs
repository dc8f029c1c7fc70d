//! `vexlog`
//!
//! Onboard telemetry and diagnostics logging for competition robots.
//!
//! The crate writes two streams to removable storage (typically the SD card):
//! a human-readable message log filtered by per-source levels, and a tabular
//! CSV log of sensor and command samples, one row per control-loop tick.
//! Storage may be absent, removed, or reinserted at any time; the logger
//! degrades to the always-available console sink and recovers on the next
//! health-check tick, without ever blocking the control loop for an
//! unbounded time.
//!
//! ## Components
//!
//! - [`LoggerContext`]: explicit owner of all logger state; construct one at
//!   startup and share it between tasks.
//! - [`LevelRegistry`] / [`Level`]: per-source minimum levels, created
//!   lazily with a `warn` default.
//! - [`StorageLifecycle`](lifecycle::StorageLifecycle): opens, closes, and
//!   rotates the numbered `(log<N>.txt, data<N>.csv)` session file pair.
//! - [`RecordEncoder`](record::RecordEncoder): accumulates named fields and
//!   emits one CSV row per tick, with a header row per session.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vexlog::{log_info, DirStorage, LoggerConfig, LoggerContext, MonotonicClock};
//!
//! let ctx = LoggerContext::new(
//!     LoggerConfig::default(),
//!     Arc::new(DirStorage::new("/usd")),
//!     Arc::new(MonotonicClock::new()),
//! );
//! ctx.init();
//!
//! // Fast loop, every 20 ms:
//! ctx.step();
//! ctx.record_field("BATT_VOLT", 12.4);
//! ctx.record_field("COMP_AUTO", true);
//! log_info!(ctx, "tick complete");
//!
//! // Slow background task, every second:
//! ctx.health_check();
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod level;
pub mod lifecycle;
pub mod record;
pub mod session;
pub mod storage;

pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use config::LoggerConfig;
pub use context::LoggerContext;
pub use error::{LogError, Result};
pub use level::{Level, LevelRegistry};
pub use record::FieldValue;
pub use session::Session;
pub use storage::{DirStorage, StorageMedium, SwitchableStorage};

/// Logs a message at an explicit level.
///
/// The filter is consulted before the format arguments are evaluated, so a
/// filtered call does no formatting work. The source is the calling module's
/// path, the line the macro invocation line.
#[macro_export]
macro_rules! log_at {
    ($ctx:expr, $level:expr, $($arg:tt)+) => {{
        let level: $crate::Level = $level;
        if $ctx.should_log(module_path!(), level) {
            $ctx.write_message(module_path!(), line!(), level, format_args!($($arg)+));
        }
    }};
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => { $crate::log_at!($ctx, $crate::Level::Debug, $($arg)+) };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => { $crate::log_at!($ctx, $crate::Level::Info, $($arg)+) };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => { $crate::log_at!($ctx, $crate::Level::Warn, $($arg)+) };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => { $crate::log_at!($ctx, $crate::Level::Error, $($arg)+) };
}

/// Logs unconditionally, bypassing the level filter.
#[macro_export]
macro_rules! log_always {
    ($ctx:expr, $($arg:tt)+) => { $crate::log_at!($ctx, $crate::Level::Always, $($arg)+) };
}

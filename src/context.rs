//! The process-wide logger context.
//!
//! [`LoggerContext`] owns every piece of mutable logger state — the level
//! registry, the lifecycle state machine, the record encoder, and the
//! console sink — as an explicit, injectable structure rather than hidden
//! statics, so tests and simulation can construct isolated instances.
//!
//! # Task model
//!
//! Two cooperative tasks drive the context:
//!
//! - the fast control-loop task calls [`step`](LoggerContext::step) once per
//!   ≈20 ms tick (before that tick's `record_field` calls) and logs messages
//!   through the macros;
//! - the slow background task calls [`health_check`](LoggerContext::health_check)
//!   about once a second.
//!
//! All methods take `&self`; internal locks are held only for bounded
//! single-row or single-message work, never across filesystem opens.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::clock::{stamp, TimeSource};
use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::level::{Level, LevelRegistry};
use crate::lifecycle::{write_message_sink, SinkSlot, StorageLifecycle, Transition};
use crate::record::{FieldValue, RecordEncoder};
use crate::storage::StorageMedium;

/// Owner of all logger state; the crate's main entry point.
pub struct LoggerContext {
    registry: Mutex<LevelRegistry>,
    lifecycle: Mutex<StorageLifecycle>,
    encoder: Mutex<RecordEncoder>,
    slot: Arc<SinkSlot>,
    clock: Arc<dyn TimeSource>,
    console: Mutex<Box<dyn Write + Send>>,
}

impl LoggerContext {
    /// Wires up a context over the given medium and time source.
    ///
    /// The console sink defaults to stdout; see
    /// [`with_console`](Self::with_console).
    pub fn new(
        config: LoggerConfig,
        storage: Arc<dyn StorageMedium>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let mut registry = LevelRegistry::new(config.default_level);
        for (source, level) in &config.levels {
            registry.set_level(source, *level);
        }

        let slot = Arc::new(SinkSlot::new());
        let lifecycle = StorageLifecycle::new(storage, slot.clone(), config.index_file);
        let encoder = RecordEncoder::new(slot.clone());

        Self {
            registry: Mutex::new(registry),
            lifecycle: Mutex::new(lifecycle),
            encoder: Mutex::new(encoder),
            slot,
            clock,
            console: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Replaces the console sink, e.g. with a captured buffer in tests.
    pub fn with_console(self, console: Box<dyn Write + Send>) -> Self {
        *self.console.lock() = console;
        self
    }

    /// Performs the initial lifecycle evaluation. Call once at startup.
    pub fn init(&self) {
        self.health_check();
    }

    /// Drives the lifecycle state machine. Call about once a second from the
    /// background task; this is also the failure-recovery mechanism.
    pub fn health_check(&self) {
        let (transition, errors) = self.lifecycle.lock().health_check();
        self.apply(transition, errors);
    }

    /// Forces a new session (new file pair, new index) regardless of whether
    /// storage changed — e.g. at a competition-phase boundary.
    pub fn segment(&self) {
        self.write_message(
            module_path!(),
            line!(),
            Level::Always,
            format_args!("segment requested, rotating to a new session"),
        );
        let (transition, errors) = self.lifecycle.lock().segment();
        self.apply(transition, errors);
    }

    /// Flushes the previous tick's data row. Call once per fast-loop tick,
    /// before that tick's [`record_field`](Self::record_field) calls.
    pub fn step(&self) {
        let millis = self.clock.millis();
        let deviation = self.encoder.lock().flush_row(millis);
        if let Some(err) = deviation {
            self.report_error(&err);
        }
    }

    /// Records one named field for the current tick. Silently dropped while
    /// the data file is unavailable.
    pub fn record_field(&self, name: &str, value: impl Into<FieldValue>) {
        self.encoder.lock().record_field(name, value.into());
    }

    /// Sets the minimum level for a source, seeding it if never seen.
    pub fn set_level(&self, source: &str, level: Level) {
        self.registry.lock().set_level(source, level);
    }

    /// Whether a message at `level` from `source` passes the filter.
    ///
    /// `Always` bypasses the registry; otherwise the source is registered on
    /// first sight with the default minimum. Callers should test this before
    /// doing any formatting work — the logging macros do.
    pub fn should_log(&self, source: &str, level: Level) -> bool {
        if level == Level::Always {
            return true;
        }
        level >= self.registry.lock().get_or_create(source)
    }

    /// Renders and writes one accepted message: always to the console sink,
    /// and to the message file when it is currently valid.
    ///
    /// Normally reached through [`log_at!`](crate::log_at) and friends,
    /// which pair it with [`should_log`](Self::should_log).
    pub fn write_message(&self, source: &str, line: u32, level: Level, args: fmt::Arguments<'_>) {
        let text = format!(
            "\n{} [{}] in {} line {}: {}",
            stamp(self.clock.millis()),
            level,
            source,
            line,
            args
        );
        // Console write failures have nowhere left to go.
        let _ = self.console.lock().write_all(text.as_bytes());
        write_message_sink(&self.slot, &text);
    }

    /// Validity of the (message, data) handle pair.
    pub fn sink_validity(&self) -> (bool, bool) {
        self.slot.validity()
    }

    /// Index of the session currently in use, if attached.
    pub fn session_index(&self) -> Option<u32> {
        self.lifecycle.lock().session().map(|s| s.index)
    }

    fn apply(&self, transition: Transition, errors: Vec<LogError>) {
        match transition {
            Transition::Opened(index) => {
                self.encoder.lock().begin_session();
                if self.should_log(module_path!(), Level::Info) {
                    self.write_message(
                        module_path!(),
                        line!(),
                        Level::Info,
                        format_args!("log files opened, session {index}"),
                    );
                }
            }
            Transition::Closed => {
                if self.should_log(module_path!(), Level::Warn) {
                    self.write_message(
                        module_path!(),
                        line!(),
                        Level::Warn,
                        format_args!("storage unavailable, log files closed"),
                    );
                }
            }
            Transition::Swapped | Transition::Unchanged => {}
        }
        for err in &errors {
            self.report_error(err);
        }
    }

    /// Failures degrade sinks rather than propagate; they surface here, at
    /// error level on the always-available sink.
    fn report_error(&self, err: &LogError) {
        if self.should_log(module_path!(), Level::Error) {
            self.write_message(module_path!(), line!(), Level::Error, format_args!("{err}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::SwitchableStorage;
    use std::sync::Mutex as StdMutex;

    /// Console sink whose contents the test can read back.
    #[derive(Clone, Default)]
    struct CapturedConsole(Arc<StdMutex<Vec<u8>>>);

    impl Write for CapturedConsole {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedConsole {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn context(dir: &std::path::Path) -> (LoggerContext, Arc<ManualClock>, CapturedConsole) {
        let clock = Arc::new(ManualClock::new());
        let console = CapturedConsole::default();
        let ctx = LoggerContext::new(
            LoggerConfig::default(),
            Arc::new(SwitchableStorage::new(dir)),
            clock.clone(),
        )
        .with_console(Box::new(console.clone()));
        (ctx, clock, console)
    }

    #[test]
    fn test_message_reaches_console_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, clock, console) = context(dir.path());
        ctx.init();
        clock.set(1234);

        ctx.write_message("robot::drive", 42, Level::Always, format_args!("hello"));
        let expected = "\n0001.234 [ALWAYS] in robot::drive line 42: hello";
        assert!(console.text().ends_with(expected));
        let file = std::fs::read_to_string(dir.path().join("log000000.txt")).unwrap();
        assert!(file.ends_with(expected));
    }

    #[test]
    fn test_message_without_storage_still_reaches_console() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _clock, console) = context(dir.path());
        // Never initialized: both handles invalid.
        ctx.write_message("robot::drive", 1, Level::Always, format_args!("lonely"));
        assert!(console.text().contains("lonely"));
        assert_eq!(ctx.sink_validity(), (false, false));
    }

    #[test]
    fn test_default_filtering() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _clock, _console) = context(dir.path());
        assert!(!ctx.should_log("robot::drive", Level::Debug));
        assert!(!ctx.should_log("robot::drive", Level::Info));
        assert!(ctx.should_log("robot::drive", Level::Warn));
        assert!(ctx.should_log("robot::drive", Level::Error));
        assert!(ctx.should_log("robot::drive", Level::Always));
    }

    #[test]
    fn test_config_seeds_registry() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::from_toml_str(
            "default_level = \"error\"\n[levels]\n\"robot::drive\" = \"debug\"\n",
        )
        .unwrap();
        let ctx = LoggerContext::new(
            config,
            Arc::new(SwitchableStorage::new(dir.path())),
            Arc::new(ManualClock::new()),
        );
        assert!(ctx.should_log("robot::drive", Level::Debug));
        assert!(!ctx.should_log("robot::intake", Level::Warn));
        assert!(ctx.should_log("robot::intake", Level::Error));
    }
}

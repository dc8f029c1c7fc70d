//! Storage lifecycle state machine and the shared file-handle slot.
//!
//! Two execution contexts touch the log files: the fast control-loop task
//! writes messages and data rows, and the slow health-check task opens,
//! closes, and swaps the files as the medium comes and goes. The
//! [`SinkSlot`] is the single point of hand-off between them: writers borrow
//! the handles under a short-lived lock, and the state machine replaces them
//! wholesale using the safe-swap procedure below.
//!
//! # Safe handle swap
//!
//! Reopening a file that another task may be writing through must never
//! expose a closed-but-not-replaced handle. The swap therefore:
//!
//! 1. takes both handles out of the slot under the lock, leaving it empty;
//! 2. closes and reopens them in append mode *outside* the lock;
//! 3. publishes the new pair back under the lock.
//!
//! A writer that observes the empty slot during step 2 sees "unavailable"
//! and drops its write, which is the chosen trade-off: bounded lock hold
//! times for the control loop, at the cost of losing writes that land inside
//! the reopen window. The lock guards only pointer publication, never I/O.
//!
//! # State machine
//!
//! | Previous  | Present? | Action                                   | Next     |
//! |-----------|----------|------------------------------------------|----------|
//! | Detached  | yes      | allocate session, open both (truncate)   | Attached |
//! | Attached  | no       | close both, invalidate both              | Detached |
//! | Attached  | yes      | safe swap (close + reopen append)        | Attached |
//! | Detached  | no       | no-op                                    | Detached |
//!
//! Every failure degrades the affected handle to invalid and is reported to
//! the caller for the always-available sink; the next tick retries.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::LogError;
use crate::session::{self, Session};
use crate::storage::StorageMedium;

/// The message/data handle pair owned by the lifecycle state machine.
#[derive(Debug, Default)]
struct HandlePair {
    message: Option<File>,
    data: Option<File>,
}

/// Shared slot through which writers reach the current file handles.
///
/// All mutation goes through the lifecycle state machine; writers only
/// borrow. The internal lock is held for single writes and pointer swaps
/// only, never across filesystem open or close calls.
#[derive(Debug, Default)]
pub struct SinkSlot {
    pair: Mutex<HandlePair>,
}

impl SinkSlot {
    /// Creates an empty slot (both handles invalid).
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the message handle if it is currently valid.
    pub fn with_message<R>(&self, f: impl FnOnce(&mut File) -> R) -> Option<R> {
        self.pair.lock().message.as_mut().map(f)
    }

    /// Runs `f` against the data handle if it is currently valid.
    pub fn with_data<R>(&self, f: impl FnOnce(&mut File) -> R) -> Option<R> {
        self.pair.lock().data.as_mut().map(f)
    }

    /// Whether the data handle is currently valid.
    pub fn data_valid(&self) -> bool {
        self.pair.lock().data.is_some()
    }

    /// Whether the message handle is currently valid.
    pub fn message_valid(&self) -> bool {
        self.pair.lock().message.is_some()
    }

    /// Validity of (message, data), primarily for tests asserting the
    /// pair invariant.
    pub fn validity(&self) -> (bool, bool) {
        let pair = self.pair.lock();
        (pair.message.is_some(), pair.data.is_some())
    }

    fn take(&self) -> HandlePair {
        std::mem::take(&mut *self.pair.lock())
    }

    fn publish(&self, next: HandlePair) {
        *self.pair.lock() = next;
    }
}

/// Outcome of one lifecycle evaluation, for the caller to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No state change (storage stayed absent).
    Unchanged,
    /// A new session with this index was opened.
    Opened(u32),
    /// The handles were swapped within the current session.
    Swapped,
    /// Storage went away; both handles were closed.
    Closed,
}

/// State machine that opens, closes, and rotates the log file pair as the
/// removable medium appears and disappears.
pub struct StorageLifecycle {
    storage: Arc<dyn StorageMedium>,
    slot: Arc<SinkSlot>,
    session: Option<Session>,
    attached: bool,
    index_file: String,
}

impl StorageLifecycle {
    /// Creates a detached state machine over the given medium and slot.
    pub fn new(storage: Arc<dyn StorageMedium>, slot: Arc<SinkSlot>, index_file: String) -> Self {
        Self {
            storage,
            slot,
            session: None,
            attached: false,
            index_file,
        }
    }

    /// The session currently in use, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Evaluates one health-check tick.
    ///
    /// Returns the transition taken plus any failures encountered; failures
    /// are degradations, never fatal, and the next tick retries.
    pub fn health_check(&mut self) -> (Transition, Vec<LogError>) {
        let mut errors = Vec::new();
        let present = self.storage.is_present();
        let transition = match (self.attached, present) {
            (false, true) => self.open_session(&mut errors),
            (true, false) => self.close_session(),
            (true, true) => self.swap(&mut errors),
            (false, false) => Transition::Unchanged,
        };
        (transition, errors)
    }

    /// Forces a clean file boundary: close the current session and
    /// immediately re-evaluate, allocating a new index if storage is
    /// present.
    pub fn segment(&mut self) -> (Transition, Vec<LogError>) {
        if self.attached {
            self.close_session();
        }
        self.health_check()
    }

    /// Detached → Attached: allocate the next session and open both files
    /// fresh.
    fn open_session(&mut self, errors: &mut Vec<LogError>) -> Transition {
        let root = self.storage.root().to_path_buf();
        let index_path = root.join(&self.index_file);

        let (index, read_error) = session::next_index(&index_path);
        if let Some(err) = read_error {
            errors.push(err);
        }
        if let Err(err) = session::persist_index(&index_path, index) {
            // Session proceeds with the computed index anyway.
            errors.push(err);
        }

        let session = Session::new(&root, index);
        let message = open_fresh(&session.message_path, errors);
        let data = open_fresh(&session.data_path, errors);
        debug!(
            index,
            message = message.is_some(),
            data = data.is_some(),
            "opened log session"
        );

        self.slot.publish(HandlePair { message, data });
        self.session = Some(session);
        self.attached = true;
        Transition::Opened(index)
    }

    /// Attached → Detached: close both handles and invalidate the slot.
    fn close_session(&mut self) -> Transition {
        // Dropping the pair closes both files.
        drop(self.slot.take());
        self.session = None;
        self.attached = false;
        debug!("closed log session, storage detached");
        Transition::Closed
    }

    /// Attached → Attached: close and reopen both files in append mode.
    ///
    /// The slot is emptied for the duration of the I/O so no writer can
    /// observe a closed handle; publish-after-reopen happens on every path.
    /// On the swap path the pair invariant is strict: if either reopen
    /// fails, both handles are left invalid.
    fn swap(&mut self, errors: &mut Vec<LogError>) -> Transition {
        let Some(session) = self.session.clone() else {
            return Transition::Unchanged;
        };

        debug!(index = session.index, "swapping log file handles");
        let old = self.slot.take();
        drop(old);

        let message = open_append(&session.message_path, errors);
        let data = open_append(&session.data_path, errors);

        if message.is_some() && data.is_some() {
            self.slot.publish(HandlePair { message, data });
            Transition::Swapped
        } else {
            // Pair validity must stay equal: a half-valid pair is never
            // published. The slot was already emptied above.
            drop(message);
            drop(data);
            Transition::Swapped
        }
    }
}

fn open_fresh(path: &Path, errors: &mut Vec<LogError>) -> Option<File> {
    match File::create(path) {
        Ok(file) => Some(file),
        Err(source) => {
            errors.push(LogError::Open {
                path: path.to_path_buf(),
                source,
            });
            None
        }
    }
}

fn open_append(path: &Path, errors: &mut Vec<LogError>) -> Option<File> {
    match OpenOptions::new().append(true).create(true).open(path) {
        Ok(file) => Some(file),
        Err(source) => {
            errors.push(LogError::Open {
                path: path.to_path_buf(),
                source,
            });
            None
        }
    }
}

/// Writes `text` through the message handle if it is valid. Returns whether
/// the write happened.
pub(crate) fn write_message_sink(slot: &SinkSlot, text: &str) -> bool {
    slot.with_message(|file| file.write_all(text.as_bytes()).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SwitchableStorage;
    use std::fs;

    fn setup(dir: &Path) -> (StorageLifecycle, Arc<SwitchableStorage>, Arc<SinkSlot>) {
        let storage = Arc::new(SwitchableStorage::new(dir));
        let slot = Arc::new(SinkSlot::new());
        let lifecycle = StorageLifecycle::new(
            storage.clone() as Arc<dyn StorageMedium>,
            slot.clone(),
            "index.txt".to_owned(),
        );
        (lifecycle, storage, slot)
    }

    #[test]
    fn test_attach_opens_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let (mut lifecycle, _storage, slot) = setup(dir.path());

        let (transition, errors) = lifecycle.health_check();
        assert_eq!(transition, Transition::Opened(0));
        assert!(errors.is_empty());
        assert_eq!(slot.validity(), (true, true));
        assert!(dir.path().join("log000000.txt").exists());
        assert!(dir.path().join("data000000.csv").exists());
    }

    #[test]
    fn test_detach_invalidates_both_handles() {
        let dir = tempfile::tempdir().unwrap();
        let (mut lifecycle, storage, slot) = setup(dir.path());
        lifecycle.health_check();

        storage.remove();
        let (transition, errors) = lifecycle.health_check();
        assert_eq!(transition, Transition::Closed);
        assert!(errors.is_empty());
        assert_eq!(slot.validity(), (false, false));

        // Absent and previously absent: no-op.
        let (transition, _) = lifecycle.health_check();
        assert_eq!(transition, Transition::Unchanged);
    }

    #[test]
    fn test_reattach_allocates_next_index() {
        let dir = tempfile::tempdir().unwrap();
        let (mut lifecycle, storage, _slot) = setup(dir.path());
        lifecycle.health_check();

        storage.remove();
        lifecycle.health_check();
        storage.insert();
        let (transition, _) = lifecycle.health_check();
        assert_eq!(transition, Transition::Opened(1));
        assert_eq!(fs::read_to_string(dir.path().join("index.txt")).unwrap(), "1");
    }

    #[test]
    fn test_swap_preserves_appended_content() {
        let dir = tempfile::tempdir().unwrap();
        let (mut lifecycle, _storage, slot) = setup(dir.path());
        lifecycle.health_check();
        write_message_sink(&slot, "before swap");

        let (transition, errors) = lifecycle.health_check();
        assert_eq!(transition, Transition::Swapped);
        assert!(errors.is_empty());
        write_message_sink(&slot, ", after swap");

        let text = fs::read_to_string(dir.path().join("log000000.txt")).unwrap();
        assert_eq!(text, "before swap, after swap");
    }

    #[test]
    fn test_removal_during_swap_leaves_pair_invalid() {
        let dir = tempfile::tempdir().unwrap();
        // DirStorage-style failure: the directory disappears underneath the
        // probe, so the append reopen fails for both files.
        let (mut lifecycle, _storage, slot) = setup(dir.path());
        lifecycle.health_check();
        assert_eq!(slot.validity(), (true, true));

        let root = dir.path().to_path_buf();
        drop(dir);
        // Probe still says present, reopen fails: both handles must end
        // invalid together.
        let (_, errors) = lifecycle.health_check();
        assert_eq!(errors.len(), 2);
        assert_eq!(slot.validity(), (false, false));

        // Medium comes back: the next tick recovers by recreating the files.
        fs::create_dir_all(&root).unwrap();
        lifecycle.health_check();
        assert_eq!(slot.validity(), (true, true));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_segment_rotates_to_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let (mut lifecycle, _storage, _slot) = setup(dir.path());
        lifecycle.health_check();
        assert_eq!(lifecycle.session().map(|s| s.index), Some(0));

        let (transition, _) = lifecycle.segment();
        assert_eq!(transition, Transition::Opened(1));
        let (transition, _) = lifecycle.segment();
        assert_eq!(transition, Transition::Opened(2));

        assert!(dir.path().join("log000001.txt").exists());
        assert!(dir.path().join("log000002.txt").exists());
        assert!(dir.path().join("data000002.csv").exists());
    }
}

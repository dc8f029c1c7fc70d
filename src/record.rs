//! Tabular data-record encoder.
//!
//! Once per control-loop tick, [`step`](crate::LoggerContext::step) opens a
//! row and the tick's `record_field` calls append one cell each, in call
//! order. The newline written by the next tick's `step` terminates the row.
//! The first row of a session is a header: `step` writes the fixed `TIME`
//! column and each `record_field` contributes its field *name*; every later
//! row starts with the elapsed-time stamp and carries values.
//!
//! Column order is a caller contract: fields must be recorded in the same
//! order every tick. The encoder captures the name sequence of the session's
//! first populated row and reports a deviation once per session instead of
//! letting columns silently misalign; the offending cells are still written.
//!
//! While the data handle is invalid, recorded fields are dropped, not
//! buffered. The encoder keeps no state across a detached period beyond the
//! session bookkeeping reset at the next open.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::clock::stamp;
use crate::error::LogError;
use crate::lifecycle::SinkSlot;

/// One recorded value: integer, floating point, or short text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer sample (counts, enum states, booleans).
    Int(i64),
    /// Floating-point sample, rendered with six decimal places.
    Float(f64),
    /// Short free-form text sample.
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v:.6}"),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// Per-tick CSV row encoder writing through the shared handle slot.
pub struct RecordEncoder {
    slot: Arc<SinkSlot>,
    /// The next row start must be the `TIME` header; set on session open,
    /// cleared once the header row has actually been started.
    header_pending: bool,
    /// The row currently being built is the header row.
    in_header_row: bool,
    /// Names written so far in the current row, for the order check.
    current: Vec<String>,
    /// Name sequence captured from the session's first populated row.
    expected: Option<Vec<String>>,
    order_reported: bool,
}

impl RecordEncoder {
    /// Creates an encoder writing through the given handle slot.
    pub fn new(slot: Arc<SinkSlot>) -> Self {
        Self {
            slot,
            header_pending: false,
            in_header_row: false,
            current: Vec::new(),
            expected: None,
            order_reported: false,
        }
    }

    /// Resets per-session state after a session (re)open: the next row
    /// started becomes the header row.
    pub fn begin_session(&mut self) {
        self.header_pending = true;
        self.in_header_row = false;
        self.current.clear();
        self.expected = None;
        self.order_reported = false;
    }

    /// Appends one cell to the current row: the field name on the header
    /// row, the value otherwise.
    ///
    /// A no-op while the data handle is invalid, and before the session's
    /// header row has been started (no row is open to append to). Dropped
    /// samples are not buffered.
    pub fn record_field(&mut self, name: &str, value: FieldValue) {
        if self.header_pending {
            return;
        }
        let cell = if self.in_header_row {
            format!(",{name}")
        } else {
            format!(",{value}")
        };
        let written = self
            .slot
            .with_data(|file| file.write_all(cell.as_bytes()).is_ok())
            .unwrap_or(false);
        if written {
            self.current.push(name.to_owned());
        }
    }

    /// Terminates the previous tick's row and starts the next one: the
    /// `TIME` header start once per session, a `\n<elapsed>` stamp
    /// otherwise. Row starts are dropped while the data handle is invalid;
    /// a still-owed header stays owed.
    ///
    /// Returns a column-order deviation to report, at most once per session.
    pub fn flush_row(&mut self, millis: u64) -> Option<LogError> {
        let names = std::mem::take(&mut self.current);
        let deviation = if self.in_header_row {
            // The header row defines the expected sequence.
            if !names.is_empty() {
                self.expected = Some(names);
            }
            self.in_header_row = false;
            None
        } else {
            self.check_column_order(names)
        };

        if self.header_pending {
            let started = self
                .slot
                .with_data(|file| file.write_all(b"TIME").is_ok())
                .unwrap_or(false);
            if started {
                self.header_pending = false;
                self.in_header_row = true;
            }
        } else {
            let start = format!("\n{}", stamp(millis));
            self.slot
                .with_data(|file| file.write_all(start.as_bytes()).is_ok());
        }
        deviation
    }

    /// Compares a completed row's name sequence against the one captured at
    /// session start.
    fn check_column_order(&mut self, names: Vec<String>) -> Option<LogError> {
        if names.is_empty() {
            // Time-only rows are legal and carry no alignment information.
            return None;
        }
        match &self.expected {
            None => {
                self.expected = Some(names);
                None
            }
            Some(expected) if *expected == names => None,
            Some(expected) => {
                if self.order_reported {
                    return None;
                }
                self.order_reported = true;
                Some(LogError::ColumnOrder {
                    expected: expected.join(","),
                    actual: names.join(","),
                })
            }
        }
    }
}

//! Error types for the parsing and analysis pipeline.
//!
//! Structural failures (unreadable source, no usable date stamps, bad date
//! math) abort the whole operation. Per-line anomalies never surface here;
//! the parser absorbs them and keeps a skip count instead.

use crate::models::EventKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The log source could not be opened or read.
    #[error("cannot read log source {path}: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The log source contained no lines at all.
    #[error("log source is empty")]
    EmptySource,

    /// No line in the source carried a leading date stamp, so no date range
    /// can be established.
    #[error("no date stamp found in any line of the source")]
    NoDateStampFound,

    /// A month abbreviation outside Jan..Dec.
    #[error("unknown month abbreviation: {0:?}")]
    UnknownMonth(String),

    /// A date that does not exist on the calendar (e.g. Feb 30).
    #[error("invalid calendar date: {0}")]
    InvalidCalendarDate(String),

    /// A date range whose end precedes its start.
    #[error("invalid date range: {last} precedes {first}")]
    InvalidRange { first: String, last: String },

    /// An event's date fell outside the range supplied to an aggregation,
    /// which means the caller paired a log with a mismatched range.
    #[error("event date {date} is outside the supplied date range")]
    DateOutOfRange { date: String },

    /// A line matched a kind's trigger pattern but lacked a field that kind
    /// requires. Absorbed by the parser as a per-line skip.
    #[error("{kind} line is missing required field {field:?}")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

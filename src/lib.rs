//! authscope: SSH auth.log parsing and security analytics.
//!
//! One pass over a syslog-style auth.log classifies each line into one of
//! ten event kinds, extracts structured fields, and tracks the file's
//! inclusive date range. Pure aggregation functions then turn the parsed
//! log into severity summaries, offender rankings, and dense hour/date
//! histograms. Storage, dataset export, and upload validation live at the
//! edges; the pipeline itself is synchronous and side-effect free.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod database;
pub mod dates;
pub mod error;
pub mod export;
pub mod extract;
pub mod intake;
pub mod models;
pub mod parser;

pub use error::{Error, Result};
pub use models::{
    DateRange, Event, EventKind, Histogram, KindHistograms, OffenderCount, ParsedLog,
    SeriesData, Severity, SeveritySummary,
};
pub use parser::LogParser;

//! Line-by-line auth.log scan.
//!
//! One pass over the source produces the full `ParsedLog` and the inclusive
//! date range of the file. Per-line anomalies (noise lines, lines missing a
//! mandatory field) are absorbed and counted; structural failures (missing
//! source, empty source, no date stamps at all) abort the read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::dates::{build_range, normalize_stamp};
use crate::error::{Error, Result};
use crate::extract::{FieldExtractor, LineMeta};
use crate::models::{DateRange, ParsedLog};

pub struct LogParser {
    assumed_year: i32,
    extractor: FieldExtractor,
    date_stamp: Regex,
    time: Regex,
    host: Regex,
    date_range: DateRange,
    skipped_lines: u64,
}

impl LogParser {
    /// Build a parser that normalizes year-less stamps under `assumed_year`.
    pub fn new(assumed_year: i32) -> Result<Self> {
        Ok(Self {
            assumed_year,
            extractor: FieldExtractor::new()?,
            date_stamp: Regex::new(r"^[A-Z][a-z]{2}\s+\d{1,2}")?,
            time: Regex::new(r"\d{2}:\d{2}:\d{2}")?,
            host: Regex::new(r"[A-Za-z]+(?:-\d{1,3}){4}")?,
            date_range: DateRange::default(),
            skipped_lines: 0,
        })
    }

    /// Parse a log file from disk.
    pub fn read_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ParsedLog> {
        self.date_range = DateRange::default();
        self.skipped_lines = 0;

        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })?;

        if file.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
            return Err(Error::EmptySource);
        }

        info!(path = %path.display(), "reading auth log");
        self.read(BufReader::new(file))
    }

    /// Parse a line-oriented stream. Produces a fresh `ParsedLog` and
    /// rebuilds the parser's date range from the stamps observed.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<ParsedLog> {
        self.date_range = DateRange::default();
        self.skipped_lines = 0;

        let mut log = ParsedLog::new();
        let mut first_stamp: Option<String> = None;
        let mut last_stamp: Option<String> = None;
        let mut saw_line = false;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            saw_line = true;

            // A leading date stamp is the structural prerequisite; lines
            // without one (continuation lines, binary junk) are not events.
            let Some(stamp) = self.date_stamp.find(&line) else {
                continue;
            };
            let stamp = stamp.as_str().to_string();
            if first_stamp.is_none() {
                first_stamp = Some(stamp.clone());
            }
            last_stamp = Some(stamp.clone());

            let Some(time) = self.time.find(&line) else {
                continue;
            };
            let Some(host) = self.host.find(&line) else {
                continue;
            };

            let Some(kind) = classify(&line) else {
                continue;
            };

            let meta = LineMeta {
                line_number: index as u64,
                date: normalize_stamp(&stamp, self.assumed_year)?,
                time: time.as_str().to_string(),
                host: host.as_str().to_string(),
            };

            match self.extractor.extract(kind, &line, meta) {
                Ok(event) => log.push(event),
                Err(e) => {
                    self.skipped_lines += 1;
                    warn!(line = index, %kind, "skipping unextractable line: {}", e);
                }
            }
        }

        if !saw_line {
            return Err(Error::EmptySource);
        }

        let (first, last) = match (first_stamp, last_stamp) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::NoDateStampFound),
        };

        let first = normalize_stamp(&first, self.assumed_year)?;
        let last = normalize_stamp(&last, self.assumed_year)?;
        self.date_range = build_range(&first, &last)?;

        debug!(
            events = log.total(),
            skipped = self.skipped_lines,
            days = self.date_range.len(),
            "parse complete"
        );
        Ok(log)
    }

    /// The inclusive date range observed by the last `read` call.
    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    /// Lines that matched a trigger but could not be extracted.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }
}

//! Aggregation over a parsed log.
//!
//! Every operation here is a pure function of its inputs and returns plain
//! data; writing results anywhere is the caller's business (see `export`).
//! Date-bucketed operations take the `DateRange` explicitly so a caller can
//! supply either the parser's own range or one rebuilt from storage.
//!
//! A defensive rule shared by all of them: a kind with no events counts as
//! zero, and a single event with a mangled time or date is skipped with a
//! warning rather than poisoning the whole aggregation.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{
    DateRange, Event, EventKind, Histogram, KindHistograms, OffenderCount, ParsedLog,
    SeveritySummary,
};

/// A fresh dense 24-slot hour map, `"00"`..`"23"`, all zero.
pub fn hour_buckets() -> Histogram {
    (0..24).map(|h| (format!("{:02}", h), 0)).collect()
}

/// Count every kind's events. Severity grouping is carried by the result.
pub fn summarize(log: &ParsedLog) -> SeveritySummary {
    let counts = EventKind::ALL.iter().map(|&k| (k, log.count(k))).collect();
    SeveritySummary::new(counts)
}

/// Rank source IPs by the number of high-severity events they produced,
/// descending, ties broken by first-encountered order, truncated to `limit`.
///
/// Only the IP-carrying high kinds participate; `AuthFailure` logs no source
/// address and is excluded.
pub fn top_offenders(log: &ParsedLog, limit: usize) -> Vec<OffenderCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();

    for kind in EventKind::OFFENDER {
        for event in log.events(kind) {
            let Some(ip) = &event.source_ip else { continue };
            if !counts.contains_key(ip) {
                order.push(ip.clone());
            }
            *counts.entry(ip.clone()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<OffenderCount> = order
        .into_iter()
        .map(|ip| {
            let count = counts[&ip];
            OffenderCount { ip, count }
        })
        .collect();
    // Stable sort keeps first-encountered order for equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// Dense per-kind hour histograms covering all ten kinds.
pub fn events_by_hour(log: &ParsedLog) -> KindHistograms {
    kind_histograms(log, &EventKind::ALL, hour_buckets, bump_hour)
}

/// Dense per-kind date histograms over the supplied range.
///
/// An event dated outside the range means the caller paired this log with
/// the wrong range, and fails with `DateOutOfRange`.
pub fn events_by_date(log: &ParsedLog, range: &DateRange) -> Result<KindHistograms> {
    try_kind_histograms(log, &EventKind::ALL, range)
}

/// Accepted vs failed password logins by hour.
pub fn login_patterns_by_hour(log: &ParsedLog) -> KindHistograms {
    kind_histograms(log, &EventKind::LOGIN, hour_buckets, bump_hour)
}

/// Accepted vs failed password logins by date.
pub fn login_patterns_by_date(log: &ParsedLog, range: &DateRange) -> Result<KindHistograms> {
    try_kind_histograms(log, &EventKind::LOGIN, range)
}

fn kind_histograms(
    log: &ParsedLog,
    kinds: &[EventKind],
    buckets: fn() -> Histogram,
    bump: fn(&mut Histogram, &Event),
) -> KindHistograms {
    let mut result = KindHistograms::new();
    for &kind in kinds {
        let mut hist = buckets();
        for event in log.events(kind) {
            bump(&mut hist, event);
        }
        result.insert(kind, hist);
    }
    result
}

fn try_kind_histograms(
    log: &ParsedLog,
    kinds: &[EventKind],
    range: &DateRange,
) -> Result<KindHistograms> {
    let mut result = KindHistograms::new();
    for &kind in kinds {
        result.insert(kind, date_histogram(log.events(kind), range)?);
    }
    Ok(result)
}

fn bump_hour(hist: &mut Histogram, event: &Event) {
    let hour = event.time.get(0..2).unwrap_or("");
    match hist.get_mut(hour) {
        Some(slot) => *slot += 1,
        None => warn!(
            line = event.line_number,
            time = %event.time,
            "skipping event with malformed time"
        ),
    }
}

fn date_histogram(events: &[Event], range: &DateRange) -> Result<Histogram> {
    let mut hist = range.buckets();
    for event in events {
        if let Some(slot) = hist.get_mut(&event.date) {
            *slot += 1;
        } else if NaiveDate::parse_from_str(&event.date, "%Y-%m-%d").is_ok() {
            return Err(Error::DateOutOfRange {
                date: event.date.clone(),
            });
        } else {
            warn!(
                line = event.line_number,
                date = %event.date,
                "skipping event with malformed date"
            );
        }
    }
    Ok(hist)
}

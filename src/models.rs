use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// The ten security-relevant event categories recognized in an auth.log.
///
/// Variant order matches classification precedence (see `classify`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    ErrorFlag,
    AuthFailure,
    Disconnect,
    SessionOpened,
    SessionClosed,
    SudoCommand,
    AcceptedPublickey,
    AcceptedPassword,
    InvalidUser,
    FailedPassword,
}

impl EventKind {
    /// All kinds, in classification precedence order.
    pub const ALL: [EventKind; 10] = [
        EventKind::ErrorFlag,
        EventKind::AuthFailure,
        EventKind::Disconnect,
        EventKind::SessionOpened,
        EventKind::SessionClosed,
        EventKind::SudoCommand,
        EventKind::AcceptedPublickey,
        EventKind::AcceptedPassword,
        EventKind::InvalidUser,
        EventKind::FailedPassword,
    ];

    /// Kinds that participate in login-pattern analysis.
    pub const LOGIN: [EventKind; 2] = [EventKind::AcceptedPassword, EventKind::FailedPassword];

    /// High-severity kinds that carry a source IP. `AuthFailure` is high
    /// severity but logs no IP, so it is excluded from offender ranking.
    pub const OFFENDER: [EventKind; 3] = [
        EventKind::ErrorFlag,
        EventKind::InvalidUser,
        EventKind::FailedPassword,
    ];

    /// Human-readable label, also used as the storage `event_type` column.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::ErrorFlag => "Error flag",
            EventKind::AuthFailure => "Authentication failure",
            EventKind::Disconnect => "Disconnect",
            EventKind::SessionOpened => "Session opened",
            EventKind::SessionClosed => "Session closed",
            EventKind::SudoCommand => "Sudo command",
            EventKind::AcceptedPublickey => "Accepted publickey",
            EventKind::AcceptedPassword => "Accepted password",
            EventKind::InvalidUser => "Invalid user",
            EventKind::FailedPassword => "Failed password",
        }
    }

    /// Snake-case name used for dataset filenames and CLI arguments.
    pub fn slug(&self) -> &'static str {
        match self {
            EventKind::ErrorFlag => "error_flag",
            EventKind::AuthFailure => "authentication_failure",
            EventKind::Disconnect => "disconnect",
            EventKind::SessionOpened => "session_opened",
            EventKind::SessionClosed => "session_closed",
            EventKind::SudoCommand => "sudo_command",
            EventKind::AcceptedPublickey => "accepted_publickey",
            EventKind::AcceptedPassword => "accepted_password",
            EventKind::InvalidUser => "invalid_user",
            EventKind::FailedPassword => "failed_password",
        }
    }

    pub fn from_slug(s: &str) -> Option<EventKind> {
        EventKind::ALL.iter().copied().find(|k| k.slug() == s)
    }

    pub fn severity(&self) -> Severity {
        match self {
            EventKind::ErrorFlag
            | EventKind::AuthFailure
            | EventKind::InvalidUser
            | EventKind::FailedPassword => Severity::High,
            EventKind::Disconnect
            | EventKind::AcceptedPublickey
            | EventKind::AcceptedPassword
            | EventKind::SessionOpened
            | EventKind::SessionClosed => Severity::Medium,
            EventKind::SudoCommand => Severity::Operational,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|k| k.label() == s)
            .ok_or_else(|| format!("Unknown event kind: {}", s))
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Severity tier used for summary grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Operational,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Operational];

    /// Kinds belonging to this tier, in taxonomy order.
    pub fn kinds(&self) -> &'static [EventKind] {
        match self {
            Severity::High => &[
                EventKind::ErrorFlag,
                EventKind::AuthFailure,
                EventKind::InvalidUser,
                EventKind::FailedPassword,
            ],
            Severity::Medium => &[
                EventKind::Disconnect,
                EventKind::AcceptedPublickey,
                EventKind::AcceptedPassword,
                EventKind::SessionOpened,
                EventKind::SessionClosed,
            ],
            Severity::Operational => &[EventKind::SudoCommand],
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "High"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Operational => write!(f, "Operational"),
        }
    }
}

/// One classified log line. Fields that do not apply to the event's kind are
/// `None`, never an empty string, so counting by presence stays meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub line_number: u64,
    #[serde(rename = "event_kind")]
    pub kind: EventKind,
    /// Normalized `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS`, 24-hour.
    pub time: String,
    pub host: String,
    pub pid: Option<String>,
    pub message: Option<String>,
    pub user: Option<String>,
    pub source_ip: Option<String>,
    pub source_port: Option<String>,
    pub directory: Option<String>,
    pub command: Option<String>,
    pub key_fingerprint: Option<String>,
}

impl Event {
    /// A bare event with only the common triple filled in.
    pub fn new(line_number: u64, kind: EventKind, date: String, time: String, host: String) -> Self {
        Self {
            line_number,
            kind,
            date,
            time,
            host,
            pid: None,
            message: None,
            user: None,
            source_ip: None,
            source_port: None,
            directory: None,
            command: None,
            key_fingerprint: None,
        }
    }
}

/// The output of one parse pass: every kind mapped to its events in line
/// order. All ten kinds are always present, unobserved ones as empty lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedLog {
    events: BTreeMap<EventKind, Vec<Event>>,
}

impl ParsedLog {
    pub fn new() -> Self {
        let mut events = BTreeMap::new();
        for kind in EventKind::ALL {
            events.insert(kind, Vec::new());
        }
        Self { events }
    }

    pub fn push(&mut self, event: Event) {
        self.events.entry(event.kind).or_default().push(event);
    }

    /// Events of one kind, in line order.
    pub fn events(&self, kind: EventKind) -> &[Event] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.events(kind).len() as u64
    }

    pub fn total(&self) -> u64 {
        self.events.values().map(|v| v.len() as u64).sum()
    }

    /// All events, kinds in taxonomy order, line order within a kind.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.values().flatten()
    }
}

impl Default for ParsedLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A dense, ordered skeleton of consecutive calendar dates, first to last
/// inclusive, each mapped to zero. Aggregations copy it before counting so
/// the template itself is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateRange {
    counts: BTreeMap<String, u64>,
}

impl DateRange {
    pub(crate) fn from_dates<I: IntoIterator<Item = String>>(dates: I) -> Self {
        Self {
            counts: dates.into_iter().map(|d| (d, 0)).collect(),
        }
    }

    /// A fresh zeroed bucket map covering the range.
    pub fn buckets(&self) -> Histogram {
        self.counts.clone()
    }

    pub fn contains(&self, date: &str) -> bool {
        self.counts.contains_key(date)
    }

    pub fn first(&self) -> Option<&str> {
        self.counts.keys().next().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.counts.keys().next_back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }
}

/// Bucket label (hour `"00"`..`"23"` or ISO date) to count.
pub type Histogram = BTreeMap<String, u64>;

/// Per-kind histograms.
pub type KindHistograms = BTreeMap<EventKind, Histogram>;

/// Per-kind counts, grouped into severity tiers on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeveritySummary {
    counts: BTreeMap<EventKind, u64>,
}

impl SeveritySummary {
    pub(crate) fn new(counts: BTreeMap<EventKind, u64>) -> Self {
        Self { counts }
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// (kind, count) rows for one tier, in taxonomy order.
    pub fn tier(&self, severity: Severity) -> Vec<(EventKind, u64)> {
        severity
            .kinds()
            .iter()
            .map(|&k| (k, self.count(k)))
            .collect()
    }

    pub fn tier_total(&self, severity: Severity) -> u64 {
        severity.kinds().iter().map(|&k| self.count(k)).sum()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// One IP and how many high-severity events it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffenderCount {
    pub ip: String,
    pub count: u64,
}

/// A named series of buckets, shaped for any chart/table renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub name: String,
    pub data: Histogram,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_label_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.label().parse::<EventKind>(), Ok(kind));
        }
        assert!("Port scan".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_slug_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_slug(kind.slug()), Some(kind));
        }
        assert_eq!(EventKind::from_slug("port_scan"), None);
    }

    #[test]
    fn test_severity_tiers_cover_all_kinds() {
        let mut seen = Vec::new();
        for severity in Severity::ALL {
            for &kind in severity.kinds() {
                assert_eq!(kind.severity(), severity);
                seen.push(kind);
            }
        }
        seen.sort();
        let mut all = EventKind::ALL.to_vec();
        all.sort();
        assert_eq!(seen, all);
    }

    #[test]
    fn test_parsed_log_has_all_kinds_when_empty() {
        let log = ParsedLog::new();
        for kind in EventKind::ALL {
            assert_eq!(log.count(kind), 0);
        }
        assert_eq!(log.total(), 0);
    }

    #[test]
    fn test_date_range_buckets_are_fresh_copies() {
        let range = DateRange::from_dates(vec![
            "2025-03-27".to_string(),
            "2025-03-28".to_string(),
        ]);
        let mut buckets = range.buckets();
        *buckets.get_mut("2025-03-27").unwrap() = 9;
        assert_eq!(range.buckets().get("2025-03-27"), Some(&0));
        assert_eq!(range.first(), Some("2025-03-27"));
        assert_eq!(range.last(), Some("2025-03-28"));
    }
}

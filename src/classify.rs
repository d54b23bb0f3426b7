//! Line classification.
//!
//! Routes a raw log line to an event kind using an ordered table of trigger
//! patterns; the first matching rule wins. Rule order is load-bearing: a
//! line containing both `error` and `Failed password` is an `ErrorFlag`
//! because the `error` rule comes first. That precedence is part of the
//! observable contract and is pinned by tests.

use crate::models::EventKind;

/// Trigger condition for one classification rule. Matching is case-sensitive
/// substring containment, not a full-line grammar.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    Contains(&'static str),
    ContainsAll(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, line: &str) -> bool {
        match self {
            Trigger::Contains(needle) => line.contains(needle),
            Trigger::ContainsAll(needles) => needles.iter().all(|n| line.contains(n)),
        }
    }
}

/// One (trigger, kind) classification rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: EventKind,
    pub trigger: Trigger,
}

/// The classification table, evaluated top to bottom.
pub const RULES: [Rule; 10] = [
    Rule {
        kind: EventKind::ErrorFlag,
        trigger: Trigger::Contains("error"),
    },
    Rule {
        kind: EventKind::AuthFailure,
        trigger: Trigger::Contains("authentication failure"),
    },
    Rule {
        kind: EventKind::Disconnect,
        trigger: Trigger::Contains("Disconnected"),
    },
    Rule {
        kind: EventKind::SessionOpened,
        trigger: Trigger::Contains("session opened"),
    },
    Rule {
        kind: EventKind::SessionClosed,
        trigger: Trigger::Contains("session closed"),
    },
    Rule {
        kind: EventKind::SudoCommand,
        trigger: Trigger::ContainsAll(&["PWD=", "USER=", "COMMAND="]),
    },
    Rule {
        kind: EventKind::AcceptedPublickey,
        trigger: Trigger::Contains("Accepted publickey"),
    },
    Rule {
        kind: EventKind::AcceptedPassword,
        trigger: Trigger::Contains("Accepted password"),
    },
    Rule {
        kind: EventKind::InvalidUser,
        trigger: Trigger::Contains("Invalid user"),
    },
    Rule {
        kind: EventKind::FailedPassword,
        trigger: Trigger::Contains("Failed password"),
    },
];

/// Classify one raw line. `None` means the line is noise, which is the
/// common case and not an error.
pub fn classify(line: &str) -> Option<EventKind> {
    RULES
        .iter()
        .find(|rule| rule.trigger.matches(line))
        .map(|rule| rule.kind)
}

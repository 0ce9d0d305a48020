//! Reference classifier — extracts a ticket number and type from note text.
//!
//! A note yields a reference when a configured keyword is followed, within
//! the configured window, by a run of at least `min_digits` decimal digits.
//! Only the first qualifying match counts. The digit run is parsed and
//! classified as a service request or an incident by the configured
//! inclusive numeric range.

use crate::config::ClassifierConfig;
use crate::error::TriageResult;
use crate::table::Value;
use crate::types::TicketId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Public types ─────────────────────────────────────────────────────────────

/// Whether a case's note yielded an actionable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageStatus {
    /// No recognized keyword-then-digit-run pattern in the note.
    NotTriaged,
    /// A reference was extracted; the case is pending against it.
    PendingReference,
    /// The classifier itself is misconfigured. Distinct from NotTriaged so
    /// callers can tell "nothing to triage" apart from "triage is broken".
    RegexError,
}

impl TriageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TriageStatus::NotTriaged => "Not Triaged",
            TriageStatus::PendingReference => "Pending Reference",
            TriageStatus::RegexError => "Regex Error",
        }
    }
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of an extracted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketKind {
    ServiceRequest,
    Incident,
}

impl TicketKind {
    pub fn label(&self) -> &'static str {
        match self {
            TicketKind::ServiceRequest => "SR",
            TicketKind::Incident => "Incident",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "SR" => Some(TicketKind::ServiceRequest),
            "Incident" => Some(TicketKind::Incident),
            _ => None,
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-row result of classification.
///
/// Invariant: `ticket` and `kind` are both Some or both None.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: TriageStatus,
    pub ticket: Option<TicketId>,
    pub kind: Option<TicketKind>,
}

impl Classification {
    pub fn not_triaged() -> Self {
        Self {
            status: TriageStatus::NotTriaged,
            ticket: None,
            kind: None,
        }
    }

    pub fn regex_error() -> Self {
        Self {
            status: TriageStatus::RegexError,
            ticket: None,
            kind: None,
        }
    }
}

// ── Classifier ───────────────────────────────────────────────────────────────

pub struct Classifier {
    pattern: Regex,
    range: (TicketId, TicketId),
}

impl Classifier {
    /// Compile the keyword/digit pattern once. A pattern that fails to
    /// compile is a configuration error, reported as TriageError::Pattern.
    pub fn new(config: &ClassifierConfig) -> TriageResult<Self> {
        let alternation = config
            .keywords
            .iter()
            .map(|k| regex::escape(&k.to_lowercase()))
            .collect::<Vec<_>>()
            .join("|");
        // (?s) so the window crosses newlines; lazy window so the nearest
        // trailing digit run wins.
        let pattern = format!(
            "(?s)(?:{alternation}).{{0,{window}}}?([0-9]{{{min},}})",
            window = config.window_chars,
            min = config.min_digits,
        );
        Ok(Self {
            pattern: Regex::new(&pattern)?,
            range: config.service_request_range,
        })
    }

    /// Classify one note cell. Non-text notes are NotTriaged with no
    /// reference; so are notes whose digit run does not parse.
    pub fn classify(&self, note: &Value) -> Classification {
        let text = match note.as_text() {
            Some(t) => t.to_lowercase(),
            None => return Classification::not_triaged(),
        };

        if let Some(caps) = self.pattern.captures(&text) {
            if let Some(run) = caps.get(1) {
                if let Ok(ticket) = run.as_str().parse::<TicketId>() {
                    return Classification {
                        status: TriageStatus::PendingReference,
                        ticket: Some(ticket),
                        kind: Some(self.kind_of(ticket)),
                    };
                }
            }
        }
        Classification::not_triaged()
    }

    /// ServiceRequest iff the identifier falls in the configured inclusive
    /// range, else Incident.
    pub fn kind_of(&self, ticket: TicketId) -> TicketKind {
        if ticket >= self.range.0 && ticket <= self.range.1 {
            TicketKind::ServiceRequest
        } else {
            TicketKind::Incident
        }
    }
}

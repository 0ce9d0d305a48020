//! Pipeline configuration.
//!
//! Everything the pipeline pattern-matches or probes by name is data here,
//! not code: classifier keyword sets and the service-request numeric range,
//! per-source column-name priority lists, breach keyword sets, and the
//! closed-status set. New source formats are accommodated by editing the
//! config, never the reconciliation logic.

use crate::error::{TriageError, TriageResult};
use crate::types::TicketId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Keyword cues scanned for in lower-cased note text. Mixed-script by
    /// default: ASCII ticket shorthands plus their Arabic equivalents.
    pub keywords: Vec<String>,
    /// Maximum characters (any content, including newlines) allowed between
    /// the keyword and the digit run.
    pub window_chars: usize,
    /// Minimum length of a qualifying digit run. Shorter runs are deliberate
    /// false negatives.
    pub min_digits: usize,
    /// Inclusive identifier range classified as a service request; anything
    /// outside is an incident. Call sites with a different boundary pass
    /// their own range.
    pub service_request_range: (TicketId, TicketId),
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keywords: vec![
                "tkt".into(),
                "sr".into(),
                "inc".into(),
                "ticket".into(),
                "incident".into(),
                "تذكرة".into(),
                "حادثة".into(),
                "بلاغ".into(),
                "طلب".into(),
            ],
            window_chars: 50,
            min_digits: 4,
            service_request_range: (15_000, 16_000),
        }
    }
}

/// Keyword sets for breach-flag normalization. Matching is case-insensitive
/// on the trimmed cell text; anything outside both sets is Unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreachKeywords {
    pub truthy: Vec<String>,
    pub falsy: Vec<String>,
}

impl Default for BreachKeywords {
    fn default() -> Self {
        Self {
            truthy: vec!["yes".into(), "true".into(), "1".into(), "passed".into()],
            falsy: vec!["no".into(), "false".into(), "0".into(), "failed".into()],
        }
    }
}

impl BreachKeywords {
    /// The incident source additionally accepts "breached"/"not breached".
    pub fn incident_default() -> Self {
        let mut kw = Self::default();
        kw.truthy.push("breached".into());
        kw.falsy.push("not breached".into());
        kw
    }
}

/// Column-name priority lists for one status-table source. Each logical
/// field is resolved once per input table by first-match probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceColumns {
    pub id_columns: Vec<String>,
    pub status_columns: Vec<String>,
    pub last_update_columns: Vec<String>,
    pub breach_columns: Vec<String>,
    pub pending_with_columns: Vec<String>,
    pub breach_keywords: BreachKeywords,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self::service_request_default()
    }
}

impl SourceColumns {
    pub fn service_request_default() -> Self {
        Self {
            id_columns: vec!["Service Request".into()],
            status_columns: vec!["Status".into()],
            last_update_columns: vec!["LastModDateTime".into()],
            breach_columns: vec!["Breach Passed".into()],
            pending_with_columns: vec!["Approval Pending with".into()],
            breach_keywords: BreachKeywords::default(),
        }
    }

    pub fn incident_default() -> Self {
        Self {
            id_columns: vec![
                "Incident".into(),
                "Incident ID".into(),
                "Incident Number".into(),
                "Number".into(),
                "Ref".into(),
            ],
            status_columns: vec!["Status".into()],
            last_update_columns: vec![
                "LastModDateTime".into(),
                "Last Update".into(),
                "Last Updated".into(),
                "Updated On".into(),
            ],
            breach_columns: vec!["Breach Passed".into()],
            pending_with_columns: Vec::new(),
            breach_keywords: BreachKeywords::incident_default(),
        }
    }
}

/// Names of the case-export columns the pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseColumns {
    pub user: String,
    pub note: String,
    pub start: String,
    pub note_date: String,
    pub channel: String,
    pub team: String,
}

impl Default for CaseColumns {
    fn default() -> Self {
        Self {
            user: "Current User Id".into(),
            note: "Last Note".into(),
            start: "Case Start Date".into(),
            note_date: "Last Note Date".into(),
            channel: "Channel".into(),
            team: "Team".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub classifier: ClassifierConfig,
    pub case_columns: CaseColumns,
    pub service_request_source: SourceColumns,
    pub incident_source: SourceColumns,
    /// Statuses counted as closed, lower-cased. Rows in these states are
    /// excluded from breach aging and feed the "Closed" weekly series.
    pub closed_statuses: Vec<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            case_columns: CaseColumns::default(),
            service_request_source: SourceColumns::service_request_default(),
            incident_source: SourceColumns::incident_default(),
            closed_statuses: vec![
                "closed".into(),
                "resolved".into(),
                "cancelled".into(),
                "completed".into(),
            ],
        }
    }
}

impl TriageConfig {
    /// Load from a JSON file. Absent fields fall back to the defaults, so a
    /// deployment only overrides what differs.
    pub fn load(path: &str) -> TriageResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TriageError::Io {
            path: path.to_string(),
            source: e,
        })?;
        let config: TriageConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

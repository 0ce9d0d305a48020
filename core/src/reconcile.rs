//! Status reconciler — joins case records against the status-table sources.
//!
//! Each source (service-request table, incident table) is reduced to an
//! immutable delta: a map from extracted identifier to the fields that
//! source owns. A delta is applied once, gated strictly by the case's
//! ticket type, so a case is only ever touched by the pass matching its
//! own type and adding further sources cannot introduce order-dependent
//! overwrites. Either table may be absent; that half of reconciliation is
//! skipped, not an error.

use crate::classify::{Classification, TicketKind};
use crate::config::{BreachKeywords, SourceColumns, TriageConfig};
use crate::error::TriageResult;
use crate::notice::Notice;
use crate::table::{Table, Value};
use crate::types::TicketId;
use chrono::NaiveDateTime;
use regex::Regex;
use std::collections::HashMap;

// ── Breach flag ──────────────────────────────────────────────────────────────

/// Tri-state breach flag: whether a service-level breach threshold was
/// exceeded, or unknown when the source value is missing or unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreachFlag {
    Passed,
    NotPassed,
    #[default]
    Unknown,
}

impl BreachFlag {
    pub fn as_value(&self) -> Value {
        match self {
            BreachFlag::Passed => Value::Bool(true),
            BreachFlag::NotPassed => Value::Bool(false),
            BreachFlag::Unknown => Value::Null,
        }
    }
}

/// Normalize a free-text or boolean breach cell against a source's keyword
/// sets. Case-insensitive on trimmed text; literal booleans map directly,
/// which also makes re-normalizing an already-normalized value a no-op.
/// Anything outside the keyword sets is Unknown, never an error.
pub fn normalize_breach(value: &Value, keywords: &BreachKeywords) -> BreachFlag {
    let text = match value {
        Value::Bool(b) => return if *b { BreachFlag::Passed } else { BreachFlag::NotPassed },
        Value::Int(n) => n.to_string(),
        Value::Text(s) => s.trim().to_lowercase(),
        _ => return BreachFlag::Unknown,
    };
    if keywords.truthy.iter().any(|k| k.to_lowercase() == text) {
        BreachFlag::Passed
    } else if keywords.falsy.iter().any(|k| k.to_lowercase() == text) {
        BreachFlag::NotPassed
    } else {
        BreachFlag::Unknown
    }
}

// ── Reconciled fields ────────────────────────────────────────────────────────

/// The fields one source contributes for one identifier.
#[derive(Debug, Clone, Default)]
pub struct ReconFields {
    pub status: Option<String>,
    pub last_update: Option<NaiveDateTime>,
    pub breach: BreachFlag,
    pub pending_with: Option<String>,
}

/// One source's contribution: which ticket type it feeds and the per-ticket
/// fields. Built once per input table, applied once.
#[derive(Debug, Clone)]
pub struct SourceDelta {
    pub kind: TicketKind,
    pub fields: HashMap<TicketId, ReconFields>,
}

// ── Reconciler ───────────────────────────────────────────────────────────────

pub struct Reconciler {
    digit_run: Regex,
    email_local: Regex,
    separators: Regex,
}

impl Reconciler {
    pub fn new(config: &TriageConfig) -> TriageResult<Self> {
        Ok(Self {
            digit_run: Regex::new(&format!("[0-9]{{{},}}", config.classifier.min_digits))?,
            email_local: Regex::new(r"([A-Za-z0-9][A-Za-z0-9._%+-]*)@[A-Za-z0-9.-]+")?,
            separators: Regex::new(r"[._+-]+")?,
        })
    }

    /// Extract the first qualifying digit run from an identifier cell.
    /// Rows whose identifier has no run cannot match anything and are
    /// dropped from the join.
    fn extract_id(&self, cell: &Value) -> Option<TicketId> {
        let text = cell.display();
        self.digit_run
            .find(&text)
            .and_then(|m| m.as_str().parse::<TicketId>().ok())
    }

    /// Normalize a pending-owner cell: the local part of the first
    /// email-like token, with separator punctuation replaced by spaces.
    /// Absent when no such token is found.
    pub fn normalize_owner(&self, cell: &Value) -> Option<String> {
        let text = cell.as_text()?;
        let local = self.email_local.captures(text)?.get(1)?.as_str();
        let name = self.separators.replace_all(local, " ").trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Reduce one status table to its delta. Returns None (with a notice)
    /// when the table has no recognizable identifier column — that half of
    /// reconciliation is skipped entirely.
    pub fn build_delta(
        &self,
        table: &Table,
        source: &SourceColumns,
        kind: TicketKind,
        table_label: &str,
        notices: &mut Vec<Notice>,
    ) -> Option<SourceDelta> {
        let Some((id_col, id_name)) = table.probe_column(&source.id_columns) else {
            Notice::push(
                notices,
                format!(
                    "{table_label} table has no identifier column (tried: {}); {} reconciliation skipped",
                    source.id_columns.join(", "),
                    kind.label(),
                ),
            );
            return None;
        };
        log::info!("{table_label} table: joining on '{id_name}'");

        let status_col = self.probe_field(table, &source.status_columns, table_label, "status", notices);
        let update_col = self.probe_field(
            table,
            &source.last_update_columns,
            table_label,
            "last update",
            notices,
        );
        let breach_col = self.probe_field(
            table,
            &source.breach_columns,
            table_label,
            "breach passed",
            notices,
        );
        let pending_col = if source.pending_with_columns.is_empty() {
            None
        } else {
            self.probe_field(
                table,
                &source.pending_with_columns,
                table_label,
                "pending owner",
                notices,
            )
        };

        let mut fields: HashMap<TicketId, ReconFields> = HashMap::new();
        for row in 0..table.n_rows() {
            let Some(ticket) = self.extract_id(table.value(row, id_col)) else {
                continue;
            };

            let recon = ReconFields {
                status: status_col.and_then(|c| {
                    let v = table.value(row, c);
                    if v.is_null() {
                        None
                    } else {
                        Some(v.display())
                    }
                }),
                last_update: update_col.and_then(|c| table.value(row, c).as_datetime()),
                breach: breach_col
                    .map(|c| normalize_breach(table.value(row, c), &source.breach_keywords))
                    .unwrap_or_default(),
                pending_with: pending_col.and_then(|c| self.normalize_owner(table.value(row, c))),
            };
            // Later rows for the same identifier win.
            fields.insert(ticket, recon);
        }

        Some(SourceDelta { kind, fields })
    }

    fn probe_field(
        &self,
        table: &Table,
        candidates: &[String],
        table_label: &str,
        field: &str,
        notices: &mut Vec<Notice>,
    ) -> Option<usize> {
        match table.probe_column(candidates) {
            Some((idx, _)) => Some(idx),
            None => {
                Notice::push(
                    notices,
                    format!("{table_label} table has no {field} column; field left blank"),
                );
                None
            }
        }
    }
}

/// Apply one delta over per-row reconciled fields, keyed strictly by type:
/// only rows whose classification matches the delta's kind are touched, and
/// a match overwrites all four reconciled fields (last write wins per type).
pub fn apply_delta(
    delta: &SourceDelta,
    classifications: &[Classification],
    reconciled: &mut [Option<ReconFields>],
) {
    for (idx, class) in classifications.iter().enumerate() {
        let (Some(ticket), Some(kind)) = (class.ticket, class.kind) else {
            continue;
        };
        if kind != delta.kind {
            continue;
        }
        if let Some(fields) = delta.fields.get(&ticket) {
            reconciled[idx] = Some(fields.clone());
        }
    }
}

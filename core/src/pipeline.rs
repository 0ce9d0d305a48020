//! Pipeline entry point — classification, enrichment, reconciliation, and
//! report assembly in one pass.
//!
//! RULES:
//!   - Status tables are explicit parameters, never ambient state.
//!   - Derived fields are populated once; only the reconciler's typed
//!     delta application writes the reconciled columns.
//!   - No per-row failure aborts the batch; degraded computations surface
//!     a Notice and the run continues.

use crate::age;
use crate::classify::{Classification, Classifier, TicketKind};
use crate::config::TriageConfig;
use crate::error::{TriageError, TriageResult};
use crate::linkage::linkage_counts;
use crate::notice::Notice;
use crate::reconcile::{apply_delta, ReconFields, Reconciler};
use crate::rollup;
use crate::table::{Table, Value};
use chrono::NaiveDate;

/// Derived column names on the enriched case table.
pub mod col {
    pub const TRIAGE_STATUS: &str = "Triage Status";
    pub const TICKET_NUMBER: &str = "Ticket Number";
    pub const TYPE: &str = "Type";
    pub const AGE_DAYS: &str = "Age (Days)";
    pub const CREATED_TODAY: &str = "Created Today";
    pub const STATUS: &str = "Status";
    pub const LAST_UPDATE: &str = "Last Update";
    pub const BREACH_PASSED: &str = "Breach Passed";
    pub const PENDING_WITH: &str = "Pending With";
    pub const CASE_COUNT: &str = "Case Count";
}

/// The enriched record set plus everything the display layer needs:
/// accumulated notices and the rollup accessors.
pub struct Report {
    pub cases: Table,
    pub notices: Vec<Notice>,
    config: TriageConfig,
}

impl Report {
    /// Source-channel × status cross-tab over cases created on `date`.
    pub fn daily_backlog(&self, date: NaiveDate) -> Table {
        rollup::daily_backlog(
            &self.cases,
            date,
            &self.config.case_columns.start,
            &self.config.case_columns.channel,
            col::STATUS,
        )
    }

    /// Still-open breached records per month of the breach timestamp.
    pub fn breached_by_month(&self) -> Table {
        rollup::breached_by_month(
            &self.cases,
            col::BREACH_PASSED,
            col::STATUS,
            col::LAST_UPDATE,
            &self.config.closed_statuses,
            &self.config.incident_source.breach_keywords,
        )
    }

    /// Team × status cross-tab with totals.
    pub fn team_summary(&self) -> Table {
        rollup::team_status_summary(&self.cases, &self.config.case_columns.team, col::STATUS)
    }

    /// Weekly created/closed long-form series.
    pub fn weekly_series(&self) -> Table {
        rollup::weekly_series(
            &self.cases,
            &self.config.case_columns.start,
            col::LAST_UPDATE,
            col::STATUS,
            &self.config.closed_statuses,
        )
    }

    /// Rows of one ticket type, with the presentation ordering convention:
    /// type and identifier first, then the reconciled status/update columns,
    /// then the remaining columns in their original order.
    pub fn filter_by_kind(&self, kind: TicketKind) -> Table {
        let Some(type_idx) = self.cases.column_index(col::TYPE) else {
            return Table::empty();
        };
        let label = kind.label();
        let narrowed = self.cases.filter(|row| row[type_idx].display() == label);
        narrowed.promote_columns(&[col::TYPE, col::TICKET_NUMBER, col::STATUS, col::LAST_UPDATE])
    }
}

/// Run the full enrichment pipeline over one uploaded case table and up to
/// two status tables. `as_of` is the reporting date for age derivations.
pub fn run_report(
    cases: &Table,
    sr_table: Option<&Table>,
    incident_table: Option<&Table>,
    config: &TriageConfig,
    as_of: NaiveDate,
) -> TriageResult<Report> {
    let mut notices: Vec<Notice> = Vec::new();
    let n = cases.n_rows();
    log::info!("triage run over {n} case rows (as of {as_of})");

    // 1. Per-row classification.
    let classifications = classify_all(cases, config, &mut notices)?;

    // 2. Age & recency.
    let (ages, today_flags) = derive_ages(cases, config, as_of, &mut notices);

    // 3. Per-type reconciliation, SR then incident. Each source reduces to
    //    an immutable delta applied once, keyed by row type.
    let reconciler = Reconciler::new(config)?;
    let mut reconciled: Vec<Option<ReconFields>> = vec![None; n];
    let sources = [
        (sr_table, &config.service_request_source, TicketKind::ServiceRequest, "Service request"),
        (incident_table, &config.incident_source, TicketKind::Incident, "Incident"),
    ];
    for (table, source, kind, label) in sources {
        let Some(table) = table else { continue };
        if let Some(delta) = reconciler.build_delta(table, source, kind, label, &mut notices) {
            log::info!("{label} table: {} joinable identifiers", delta.fields.len());
            apply_delta(&delta, &classifications, &mut reconciled);
        }
    }

    // 4. Linkage counts.
    let counts = linkage_counts(&classifications);

    // 5. Assemble the enriched table.
    let mut enriched = cases.clone();
    enriched.set_column(
        col::TRIAGE_STATUS,
        classifications
            .iter()
            .map(|c| Value::Text(c.status.label().into()))
            .collect(),
    );
    enriched.set_column(
        col::TICKET_NUMBER,
        classifications
            .iter()
            .map(|c| c.ticket.map(|t| Value::Int(t as i64)).unwrap_or(Value::Null))
            .collect(),
    );
    enriched.set_column(
        col::TYPE,
        classifications
            .iter()
            .map(|c| {
                c.kind
                    .map(|k| Value::Text(k.label().into()))
                    .unwrap_or(Value::Null)
            })
            .collect(),
    );
    enriched.set_column(
        col::AGE_DAYS,
        ages.iter()
            .map(|a| a.map(Value::Int).unwrap_or(Value::Null))
            .collect(),
    );
    enriched.set_column(
        col::CREATED_TODAY,
        today_flags
            .iter()
            .map(|t| t.map(Value::Bool).unwrap_or(Value::Null))
            .collect(),
    );
    enriched.set_column(
        col::STATUS,
        reconciled
            .iter()
            .map(|r| {
                r.as_ref()
                    .and_then(|f| f.status.clone())
                    .map(Value::Text)
                    .unwrap_or(Value::Null)
            })
            .collect(),
    );
    enriched.set_column(
        col::LAST_UPDATE,
        reconciled
            .iter()
            .map(|r| {
                r.as_ref()
                    .and_then(|f| f.last_update)
                    .map(Value::DateTime)
                    .unwrap_or(Value::Null)
            })
            .collect(),
    );
    enriched.set_column(
        col::BREACH_PASSED,
        reconciled
            .iter()
            .map(|r| r.as_ref().map(|f| f.breach.as_value()).unwrap_or(Value::Null))
            .collect(),
    );
    enriched.set_column(
        col::PENDING_WITH,
        reconciled
            .iter()
            .map(|r| {
                r.as_ref()
                    .and_then(|f| f.pending_with.clone())
                    .map(Value::Text)
                    .unwrap_or(Value::Null)
            })
            .collect(),
    );
    enriched.set_column(
        col::CASE_COUNT,
        counts
            .iter()
            .map(|c| c.map(|n| Value::Int(n as i64)).unwrap_or(Value::Null))
            .collect(),
    );

    Ok(Report {
        cases: enriched,
        notices,
        config: config.clone(),
    })
}

/// Classify every note. A missing note column degrades every row to
/// NotTriaged; a misconfigured pattern stamps the distinct RegexError
/// status so callers can tell it apart from "nothing to triage".
fn classify_all(
    cases: &Table,
    config: &TriageConfig,
    notices: &mut Vec<Notice>,
) -> TriageResult<Vec<Classification>> {
    let n = cases.n_rows();

    let Some(note_idx) = cases.column_index(&config.case_columns.note) else {
        Notice::push(
            notices,
            format!(
                "Case table has no '{}' column; triage classification skipped",
                config.case_columns.note
            ),
        );
        return Ok(vec![Classification::not_triaged(); n]);
    };

    match Classifier::new(&config.classifier) {
        Ok(classifier) => Ok((0..n)
            .map(|row| classifier.classify(cases.value(row, note_idx)))
            .collect()),
        Err(TriageError::Pattern(e)) => {
            Notice::push(notices, format!("Classifier pattern is invalid: {e}"));
            Ok(vec![Classification::regex_error(); n])
        }
        Err(e) => Err(e),
    }
}

fn derive_ages(
    cases: &Table,
    config: &TriageConfig,
    as_of: NaiveDate,
    notices: &mut Vec<Notice>,
) -> (Vec<Option<i64>>, Vec<Option<bool>>) {
    let n = cases.n_rows();
    let Some(start_idx) = cases.column_index(&config.case_columns.start) else {
        Notice::push(
            notices,
            format!(
                "Case table has no '{}' column; age calculation skipped",
                config.case_columns.start
            ),
        );
        return (vec![None; n], vec![None; n]);
    };

    let mut ages = Vec::with_capacity(n);
    let mut today_flags = Vec::with_capacity(n);
    for row in 0..n {
        let start = cases.value(row, start_idx);
        ages.push(age::case_age_days(start, as_of));
        today_flags.push(age::created_today(start, as_of));
    }
    (ages, today_flags)
}

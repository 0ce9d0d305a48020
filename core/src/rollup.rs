//! Time-bucketed rollups and cross-tabulations over the enriched case table.
//!
//! Every operation here degrades to an empty table when a required column
//! is absent or nothing matches; none of them can fail.

use crate::config::BreachKeywords;
use crate::reconcile::{normalize_breach, BreachFlag};
use crate::table::{Table, Value};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// Trailing total row/column label.
const TOTAL: &str = "Total";

// ── Cross-tabulation ─────────────────────────────────────────────────────────

/// Count rows by (row key, column key) over two named columns, with a
/// trailing Total row and Total column. Rows where either key is null are
/// skipped. Returns an empty table when either column is absent or no rows
/// carry both keys.
pub fn cross_tab(table: &Table, row_col: &str, col_col: &str) -> Table {
    let (Some(ri), Some(ci)) = (table.column_index(row_col), table.column_index(col_col)) else {
        return Table::empty();
    };

    // BTreeMap keeps both axes sorted.
    let mut counts: BTreeMap<String, BTreeMap<String, i64>> = BTreeMap::new();
    let mut col_keys: BTreeMap<String, ()> = BTreeMap::new();
    for row in table.rows() {
        if row[ri].is_null() || row[ci].is_null() {
            continue;
        }
        let rk = row[ri].display();
        let ck = row[ci].display();
        col_keys.insert(ck.clone(), ());
        *counts.entry(rk).or_default().entry(ck).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return Table::empty();
    }

    let mut columns: Vec<String> = vec![row_col.to_string()];
    columns.extend(col_keys.keys().cloned());
    columns.push(TOTAL.into());

    let mut out = Table::new(columns);
    let mut col_totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut grand_total = 0i64;

    for (rk, row_counts) in &counts {
        let mut row = vec![Value::Text(rk.clone())];
        let mut row_total = 0i64;
        for ck in col_keys.keys() {
            let n = row_counts.get(ck).copied().unwrap_or(0);
            row.push(Value::Int(n));
            row_total += n;
            *col_totals.entry(ck.clone()).or_insert(0) += n;
        }
        row.push(Value::Int(row_total));
        grand_total += row_total;
        out.push_row(row);
    }

    let mut totals = vec![Value::Text(TOTAL.into())];
    for ck in col_keys.keys() {
        totals.push(Value::Int(col_totals.get(ck).copied().unwrap_or(0)));
    }
    totals.push(Value::Int(grand_total));
    out.push_row(totals);
    out
}

// ── Daily backlog growth ─────────────────────────────────────────────────────

/// Source-channel × status cross-tab over cases created on the target date.
/// Empty table when no records match or required fields are absent.
pub fn daily_backlog(
    table: &Table,
    date: NaiveDate,
    start_col: &str,
    channel_col: &str,
    status_col: &str,
) -> Table {
    let Some(si) = table.column_index(start_col) else {
        return Table::empty();
    };
    let created_on = table.filter(|row| row[si].as_date() == Some(date));
    if created_on.is_empty() {
        return Table::empty();
    }
    cross_tab(&created_on, channel_col, status_col)
}

// ── Breached incidents by month ──────────────────────────────────────────────

/// Count still-open breached records per year-month of the breach
/// (last-update) timestamp, with a trailing Total row. An empty two-column
/// table (no Total row) when nothing qualifies.
pub fn breached_by_month(
    table: &Table,
    breach_col: &str,
    status_col: &str,
    date_col: &str,
    closed_statuses: &[String],
    keywords: &BreachKeywords,
) -> Table {
    let mut out = Table::new(vec!["Month".into(), "Breached Incidents".into()]);

    let (Some(bi), Some(sti), Some(di)) = (
        table.column_index(breach_col),
        table.column_index(status_col),
        table.column_index(date_col),
    ) else {
        return out;
    };

    let mut months: BTreeMap<String, i64> = BTreeMap::new();
    for row in table.rows() {
        if normalize_breach(&row[bi], keywords) != BreachFlag::Passed {
            continue;
        }
        let status = row[sti].display().trim().to_lowercase();
        if closed_statuses.iter().any(|s| *s == status) {
            continue;
        }
        let Some(dt) = row[di].as_datetime() else {
            continue;
        };
        *months.entry(dt.format("%Y-%m").to_string()).or_insert(0) += 1;
    }
    if months.is_empty() {
        return out;
    }

    let mut total = 0i64;
    for (month, count) in &months {
        out.push_row(vec![Value::Text(month.clone()), Value::Int(*count)]);
        total += count;
    }
    out.push_row(vec![Value::Text(TOTAL.into()), Value::Int(total)]);
    out
}

// ── Team/status summary ──────────────────────────────────────────────────────

/// Team × status cross-tab with totals.
pub fn team_status_summary(table: &Table, team_col: &str, status_col: &str) -> Table {
    cross_tab(table, team_col, status_col)
}

// ── Weekly created/closed series ─────────────────────────────────────────────

/// Long-form weekly series: cases bucketed by ISO year-week of creation
/// ("Created") and, for closed-equivalent statuses, of last modification
/// ("Closed"). One row per (week, category) with a readable week label.
pub fn weekly_series(
    table: &Table,
    start_col: &str,
    update_col: &str,
    status_col: &str,
    closed_statuses: &[String],
) -> Table {
    let mut out = Table::new(vec![
        "Week".into(),
        "Week Label".into(),
        "Count".into(),
        "Category".into(),
    ]);

    if let Some(si) = table.column_index(start_col) {
        let created = bucket_by_week(table.rows().map(|row| &row[si]));
        emit_series(&mut out, &created, "Created");
    }

    if let (Some(ui), Some(sti)) = (table.column_index(update_col), table.column_index(status_col))
    {
        let closed_dates = table.rows().filter_map(|row| {
            let status = row[sti].display().trim().to_lowercase();
            if closed_statuses.iter().any(|s| *s == status) {
                Some(&row[ui])
            } else {
                None
            }
        });
        let closed: Vec<&Value> = closed_dates.collect();
        let closed = bucket_by_week(closed.into_iter());
        emit_series(&mut out, &closed, "Closed");
    }

    out
}

/// ISO year-week key ("2024-W23") → count. Unparseable cells are skipped.
fn bucket_by_week<'a>(cells: impl Iterator<Item = &'a Value>) -> BTreeMap<String, i64> {
    let mut weeks: BTreeMap<String, i64> = BTreeMap::new();
    for cell in cells {
        let Some(date) = cell.as_date() else { continue };
        let iso = date.iso_week();
        let key = format!("{}-W{:02}", iso.year(), iso.week());
        *weeks.entry(key).or_insert(0) += 1;
    }
    weeks
}

fn emit_series(out: &mut Table, weeks: &BTreeMap<String, i64>, category: &str) {
    for (key, count) in weeks {
        out.push_row(vec![
            Value::Text(key.clone()),
            Value::Text(week_label(key)),
            Value::Int(*count),
            Value::Text(category.to_string()),
        ]);
    }
}

/// Human-readable label for an ISO week key: the Monday that opens it.
fn week_label(key: &str) -> String {
    let parse = || -> Option<NaiveDate> {
        let (year, week) = key.split_once("-W")?;
        NaiveDate::from_isoywd_opt(year.parse().ok()?, week.parse().ok()?, Weekday::Mon)
    };
    match parse() {
        Some(monday) => format!("Week of {}", monday.format("%d %b %Y")),
        None => key.to_string(),
    }
}

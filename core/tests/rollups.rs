//! Integration tests for cross-tabs and time-bucketed rollups.

use triage_core::{
    config::BreachKeywords,
    rollup::{breached_by_month, cross_tab, daily_backlog, team_status_summary, weekly_series},
    table::{Table, Value},
};
use chrono::NaiveDate;

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

fn table(cols: &[&str], rows: Vec<Vec<Value>>) -> Table {
    let mut t = Table::new(cols.iter().map(|s| s.to_string()).collect());
    for row in rows {
        t.push_row(row);
    }
    t
}

fn cell_int(t: &Table, row: usize, col: &str) -> i64 {
    match t.cell(row, col) {
        Value::Int(n) => *n,
        other => panic!("expected Int at row {row} col {col}, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cross-tabulation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cross_tab_counts_with_total_row_and_column() {
    let t = table(
        &["Channel", "Status"],
        vec![
            vec![text("Email"), text("Open")],
            vec![text("Email"), text("Open")],
            vec![text("Email"), text("Closed")],
            vec![text("Phone"), text("Open")],
        ],
    );
    let xt = cross_tab(&t, "Channel", "Status");

    assert_eq!(xt.columns(), &["Channel", "Closed", "Open", "Total"]);
    assert_eq!(xt.n_rows(), 3, "two channels plus the Total row");

    // Email row
    assert_eq!(xt.cell(0, "Channel"), &text("Email"));
    assert_eq!(cell_int(&xt, 0, "Closed"), 1);
    assert_eq!(cell_int(&xt, 0, "Open"), 2);
    assert_eq!(cell_int(&xt, 0, "Total"), 3);
    // Phone row
    assert_eq!(cell_int(&xt, 1, "Open"), 1);
    assert_eq!(cell_int(&xt, 1, "Total"), 1);
    // Totals row equals the column sums
    assert_eq!(xt.cell(2, "Channel"), &text("Total"));
    assert_eq!(cell_int(&xt, 2, "Closed"), 1);
    assert_eq!(cell_int(&xt, 2, "Open"), 3);
    assert_eq!(cell_int(&xt, 2, "Total"), 4);
}

#[test]
fn cross_tab_degrades_to_empty_on_missing_columns() {
    let t = table(&["Channel"], vec![vec![text("Email")]]);
    assert!(cross_tab(&t, "Channel", "Status").is_empty());
    assert!(cross_tab(&t, "Team", "Channel").is_empty());
}

#[test]
fn cross_tab_skips_rows_with_null_keys() {
    let t = table(
        &["Channel", "Status"],
        vec![
            vec![text("Email"), Value::Null],
            vec![Value::Null, text("Open")],
        ],
    );
    assert!(cross_tab(&t, "Channel", "Status").is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Daily backlog growth
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn daily_backlog_filters_by_creation_date() {
    let t = table(
        &["Case Start Date", "Channel", "Status"],
        vec![
            vec![text("2024-06-10 08:00:00"), text("Email"), text("Open")],
            vec![text("2024-06-10 09:30:00"), text("Phone"), text("Open")],
            vec![text("2024-06-09 17:00:00"), text("Email"), text("Open")],
        ],
    );
    let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let backlog = daily_backlog(&t, day, "Case Start Date", "Channel", "Status");

    assert_eq!(backlog.n_rows(), 3, "Email, Phone, Total");
    let total_row = backlog.n_rows() - 1;
    assert_eq!(cell_int(&backlog, total_row, "Total"), 2);
}

#[test]
fn daily_backlog_is_empty_when_nothing_matches() {
    let t = table(
        &["Case Start Date", "Channel", "Status"],
        vec![vec![text("2024-06-09 17:00:00"), text("Email"), text("Open")]],
    );
    let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    assert!(daily_backlog(&t, day, "Case Start Date", "Channel", "Status").is_empty());

    // Missing creation column short-circuits to empty as well.
    let bare = table(&["Channel"], vec![vec![text("Email")]]);
    assert!(daily_backlog(&bare, day, "Case Start Date", "Channel", "Status").is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Breached incidents by month
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn breached_by_month_counts_open_breaches_per_month() {
    let closed = vec!["closed".to_string(), "resolved".to_string()];
    let kw = BreachKeywords::incident_default();
    let t = table(
        &["Breach Passed", "Status", "Last Update"],
        vec![
            vec![Value::Bool(true), text("Open"), text("2024-05-02 10:00:00")],
            vec![text("Yes"), text("In Progress"), text("2024-05-20 09:00:00")],
            vec![Value::Bool(true), text("Open"), text("2024-06-01 12:00:00")],
            // Closed breach is excluded
            vec![Value::Bool(true), text("Closed"), text("2024-05-03 10:00:00")],
            // Unbreached row is excluded
            vec![Value::Bool(false), text("Open"), text("2024-05-04 10:00:00")],
            // Unknown breach is excluded
            vec![Value::Null, text("Open"), text("2024-05-05 10:00:00")],
        ],
    );

    let monthly = breached_by_month(&t, "Breach Passed", "Status", "Last Update", &closed, &kw);
    assert_eq!(monthly.columns(), &["Month", "Breached Incidents"]);
    assert_eq!(monthly.n_rows(), 3, "two months plus the Total row");
    assert_eq!(monthly.cell(0, "Month"), &text("2024-05"));
    assert_eq!(cell_int(&monthly, 0, "Breached Incidents"), 2);
    assert_eq!(monthly.cell(1, "Month"), &text("2024-06"));
    assert_eq!(cell_int(&monthly, 1, "Breached Incidents"), 1);
    assert_eq!(monthly.cell(2, "Month"), &text("Total"));
    assert_eq!(cell_int(&monthly, 2, "Breached Incidents"), 3);
}

#[test]
fn breached_by_month_empty_result_has_no_total_row() {
    let closed = vec!["closed".to_string()];
    let kw = BreachKeywords::incident_default();
    let t = table(
        &["Breach Passed", "Status", "Last Update"],
        vec![vec![Value::Bool(false), text("Open"), text("2024-05-04")]],
    );
    let monthly = breached_by_month(&t, "Breach Passed", "Status", "Last Update", &closed, &kw);
    assert_eq!(monthly.columns(), &["Month", "Breached Incidents"]);
    assert_eq!(monthly.n_rows(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Team summary and weekly series
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn team_summary_totals_each_column() {
    let t = table(
        &["Team", "Status"],
        vec![
            vec![text("Payroll"), text("Open")],
            vec![text("Payroll"), text("Open")],
            vec![text("Pensions"), text("Open")],
        ],
    );
    let summary = team_status_summary(&t, "Team", "Status");
    let total_row = summary.n_rows() - 1;
    assert_eq!(summary.cell(total_row, "Team"), &text("Total"));
    assert_eq!(cell_int(&summary, total_row, "Open"), 3);
}

#[test]
fn weekly_series_buckets_created_and_closed() {
    let closed = vec!["closed".to_string()];
    // 2024-06-10 is a Monday (ISO week 24); 2024-06-03 opens week 23.
    let t = table(
        &["Case Start Date", "Last Update", "Status"],
        vec![
            vec![text("2024-06-03"), text("2024-06-10"), text("Closed")],
            vec![text("2024-06-04"), Value::Null, text("Open")],
            vec![text("2024-06-10"), Value::Null, text("Open")],
        ],
    );
    let series = weekly_series(&t, "Case Start Date", "Last Update", "Status", &closed);
    assert_eq!(series.columns(), &["Week", "Week Label", "Count", "Category"]);

    let rows: Vec<(String, i64, String)> = (0..series.n_rows())
        .map(|i| {
            (
                series.cell(i, "Week").display(),
                match series.cell(i, "Count") {
                    Value::Int(n) => *n,
                    other => panic!("expected count, got {other:?}"),
                },
                series.cell(i, "Category").display(),
            )
        })
        .collect();

    assert!(rows.contains(&("2024-W23".into(), 2, "Created".into())));
    assert!(rows.contains(&("2024-W24".into(), 1, "Created".into())));
    assert!(rows.contains(&("2024-W24".into(), 1, "Closed".into())));
    assert_eq!(rows.len(), 3);

    // Labels name the Monday opening the week.
    let label_row = (0..series.n_rows())
        .find(|&i| series.cell(i, "Week").display() == "2024-W23")
        .unwrap();
    assert_eq!(
        series.cell(label_row, "Week Label").display(),
        "Week of 03 Jun 2024"
    );
}

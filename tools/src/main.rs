//! report-runner: headless triage report generator.
//!
//! Usage:
//!   report-runner --cases cases.json --service-requests sr.json --incidents inc.json
//!   report-runner --cases cases.json --as-of 2024-06-10 --backlog-date 2024-06-10 --out enriched.json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::env;
use std::fs;
use triage_core::{
    classify::TicketKind,
    config::TriageConfig,
    pipeline::{run_report, Report},
    table::Table,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(cases_path) = flag_value(&args, "--cases") else {
        eprintln!(
            "usage: report-runner --cases <json> [--service-requests <json>] [--incidents <json>]\n\
             \x20                    [--config <json>] [--as-of YYYY-MM-DD] [--backlog-date YYYY-MM-DD]\n\
             \x20                    [--kind SR|Incident] [--out <json>]"
        );
        std::process::exit(2);
    };

    let config = match flag_value(&args, "--config") {
        Some(path) => TriageConfig::load(path)?,
        None => TriageConfig::default(),
    };

    let as_of = match flag_value(&args, "--as-of") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };

    let cases = load_table(cases_path)?;
    let sr_table = flag_value(&args, "--service-requests")
        .map(load_table)
        .transpose()?;
    let incident_table = flag_value(&args, "--incidents").map(load_table).transpose()?;

    println!("report-runner");
    println!("  cases:     {cases_path} ({} rows)", cases.n_rows());
    println!(
        "  sr table:  {}",
        sr_table
            .as_ref()
            .map(|t| format!("{} rows", t.n_rows()))
            .unwrap_or_else(|| "none".into())
    );
    println!(
        "  incidents: {}",
        incident_table
            .as_ref()
            .map(|t| format!("{} rows", t.n_rows()))
            .unwrap_or_else(|| "none".into())
    );
    println!("  as of:     {as_of}");
    println!();

    let report = run_report(
        &cases,
        sr_table.as_ref(),
        incident_table.as_ref(),
        &config,
        as_of,
    )?;

    print_summary(&report);

    if let Some(date) = flag_value(&args, "--backlog-date") {
        let date = parse_date(date)?;
        print_table(&format!("Daily backlog ({date})"), &report.daily_backlog(date));
    }
    print_table("Breached by month", &report.breached_by_month());
    print_table("Team summary", &report.team_summary());
    print_table("Weekly created/closed", &report.weekly_series());

    if let Some(kind) = flag_value(&args, "--kind") {
        let kind = TicketKind::from_label(kind)
            .with_context(|| format!("unknown ticket kind '{kind}' (expected SR or Incident)"))?;
        print_table(&format!("{kind} cases"), &report.filter_by_kind(kind));
    }

    if let Some(out) = flag_value(&args, "--out") {
        let json = serde_json::to_string_pretty(&report.cases.to_records())?;
        fs::write(out, json).with_context(|| format!("cannot write {out}"))?;
        println!("enriched record set written to {out}");
    }

    Ok(())
}

fn print_summary(report: &Report) {
    if !report.notices.is_empty() {
        println!("=== NOTICES ===");
        for notice in &report.notices {
            println!("  ! {notice}");
        }
        println!();
    }

    println!("=== ENRICHED CASES ===");
    print_table_body(&report.cases);
    println!();
}

fn print_table(title: &str, table: &Table) {
    println!("=== {} ===", title.to_uppercase());
    if table.n_rows() == 0 {
        println!("  (empty)");
    } else {
        print_table_body(table);
    }
    println!();
}

fn print_table_body(table: &Table) {
    // Column widths from header and cell text.
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for row in table.rows() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.display().chars().count());
        }
    }

    let header: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{:width$}", c, width = widths[i]))
        .collect();
    println!("  {}", header.join(" | "));

    for row in table.rows() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell.display(), width = widths[i]))
            .collect();
        println!("  {}", cells.join(" | "));
    }
}

fn load_table(path: &str) -> Result<Table> {
    let content = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    let json: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{path} is not valid JSON"))?;
    Ok(Table::from_records(&json)?)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{DashboardSummary, Dataset, OverdueRecord, PeriodStat};
use crate::overdue::{self, OverdueLists};
use crate::period::{self, Period};

pub const NEVER_LABEL: &str = "never";

/// Everything the dashboard shows, computed against one reference clock.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: NaiveDateTime,
    pub summary: DashboardSummary,
    pub overdue: OverdueLists,
    pub period: Period,
    pub window_start: NaiveDate,
    pub stats: Vec<PeriodStat>,
}

pub fn build_dashboard(dataset: &Dataset, period: Period, now: NaiveDateTime) -> Dashboard {
    let records = overdue::overdue_records(&dataset.students, &dataset.communications, now);
    let today = now.date();

    Dashboard {
        generated_at: now,
        summary: overdue::summarize(&dataset.students, &records),
        overdue: overdue::overdue_lists(&records),
        period,
        window_start: period::window_start(period, today),
        stats: period::stats_by_period(&dataset.students, &dataset.communications, period, today),
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => NEVER_LABEL.to_string(),
    }
}

pub fn render_summary(summary: &DashboardSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Students:       {}", summary.total_students);
    let _ = writeln!(output, "Graduates:      {}", summary.graduates);
    let _ = writeln!(output, "Undergraduates: {}", summary.undergraduates);
    let _ = writeln!(output, "Overdue:        {}", summary.overdue_students);
    output
}

pub fn render_overdue(lists: &OverdueLists) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Graduates overdue (more than 14 days):");
    write_overdue_lines(&mut output, &lists.graduates);
    let _ = writeln!(output);
    let _ = writeln!(output, "Undergraduates overdue (more than 30 days):");
    write_overdue_lines(&mut output, &lists.undergraduates);
    output
}

fn write_overdue_lines(output: &mut String, records: &[OverdueRecord]) {
    if records.is_empty() {
        let _ = writeln!(output, "  No overdue students.");
        return;
    }

    for record in records {
        let _ = writeln!(
            output,
            "  - {} last contact {}, {} days overdue [{}]",
            record.name,
            format_date(record.last_comm_date),
            record.days_overdue,
            record.severity.label()
        );
    }
}

pub fn render_stats(period: Period, stats: &[PeriodStat]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Communication counts ({}):", period.title().to_lowercase());

    if stats.is_empty() {
        let _ = writeln!(output, "  No data.");
        return output;
    }

    for stat in stats {
        let _ = writeln!(
            output,
            "  - {} ({}) {} communications, last {}",
            stat.name,
            stat.kind.label(),
            stat.count,
            format_date(stat.last_comm)
        );
    }
    output
}

pub fn build_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Communication Dashboard");
    let _ = writeln!(
        output,
        "Last updated {}",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(output);

    let summary = &dashboard.summary;
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Students: {}", summary.total_students);
    let _ = writeln!(output, "- Graduates: {}", summary.graduates);
    let _ = writeln!(output, "- Undergraduates: {}", summary.undergraduates);
    let _ = writeln!(output, "- Overdue: {}", summary.overdue_students);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Graduates Overdue");
    write_overdue_table(&mut output, &dashboard.overdue.graduates);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Undergraduates Overdue");
    write_overdue_table(&mut output, &dashboard.overdue.undergraduates);

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Communication Stats: {} (since {})",
        dashboard.period.title(),
        dashboard.window_start
    );

    if dashboard.stats.is_empty() {
        let _ = writeln!(output, "No data.");
    } else {
        let _ = writeln!(output, "| Name | Type | Count | Last contact |");
        let _ = writeln!(output, "|---|---|---|---|");
        for stat in dashboard.stats.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                stat.name,
                stat.kind.label(),
                stat.count,
                format_date(stat.last_comm)
            );
        }
    }

    output
}

fn write_overdue_table(output: &mut String, records: &[OverdueRecord]) {
    if records.is_empty() {
        let _ = writeln!(output, "No overdue students.");
        return;
    }

    let _ = writeln!(output, "| Name | Last contact | Days overdue | Severity |");
    let _ = writeln!(output, "|---|---|---|---|");
    for record in records {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} |",
            record.name,
            format_date(record.last_comm_date),
            record.days_overdue,
            record.severity.label()
        );
    }
}

use std::fmt::Write;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use crate::response::{ReportResponse, ReportRows};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Csv,
}

pub fn render(response: &ReportResponse, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Markdown => Ok(markdown(response)),
        OutputFormat::Csv => csv_rows(&response.rows),
    }
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.date_naive().to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn markdown(response: &ReportResponse) -> String {
    let mut output = String::new();
    let highlights = &response.highlights;
    let scope = &response.scope;

    let _ = writeln!(output, "# Training Compliance Report");
    let _ = writeln!(output, "{}", response.summary);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Scope: {} role, {} user(s), due-soon window {} days{}",
        scope.role,
        scope.users,
        scope.due_soon_days,
        scope
            .net_id_filter
            .as_deref()
            .map(|net_id| format!(", net id {net_id}"))
            .unwrap_or_default()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Highlights");
    let _ = writeln!(output, "- Assignments: {}", highlights.total_assignments);
    let _ = writeln!(output, "- Compliant: {}", highlights.compliant);
    let _ = writeln!(output, "- Overdue: {}", highlights.overdue);
    let _ = writeln!(output, "- Due soon: {}", highlights.due_soon);
    let _ = writeln!(output, "- Not started: {}", highlights.not_started);
    let _ = writeln!(output, "- Completion rate: {:.1}%", highlights.completion_rate);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rows");

    if response.rows.is_empty() {
        let _ = writeln!(output, "Nothing to report.");
    } else {
        match &response.rows {
            ReportRows::Detail(rows) => {
                for row in rows {
                    let _ = writeln!(
                        output,
                        "- {} ({}, {}): {} [{}] last {} next {}",
                        row.full_name,
                        row.net_id,
                        row.job_title,
                        row.training_title,
                        row.status.as_str(),
                        date(row.last_completed_at),
                        date(row.next_due_at)
                    );
                }
            }
            ReportRows::JobTitles(rows) => {
                for row in rows {
                    let _ = writeln!(
                        output,
                        "- {}: {:.1}% of {} compliant ({} overdue, {} due soon, {} not started)",
                        row.job_title,
                        row.completion_rate,
                        row.total,
                        row.overdue,
                        row.due_soon,
                        row.not_started
                    );
                }
            }
            ReportRows::Trainings(rows) => {
                for row in rows {
                    let _ = writeln!(
                        output,
                        "- {} ({}, {}) score {}",
                        row.title,
                        row.category.as_str(),
                        row.frequency.as_str(),
                        row.match_score
                    );
                }
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Try Next");
    for prompt in &response.suggested_prompts {
        let _ = writeln!(output, "- {prompt}");
    }

    output
}

const DETAIL_COLUMNS: &[&str] = &[
    "user_id",
    "full_name",
    "net_id",
    "job_title",
    "training_id",
    "training_title",
    "category",
    "frequency",
    "status",
    "last_completed_at",
    "next_due_at",
];

const JOB_TITLE_COLUMNS: &[&str] = &[
    "job_title",
    "total",
    "compliant",
    "overdue",
    "due_soon",
    "not_started",
    "completion_rate",
];

const TRAINING_COLUMNS: &[&str] = &["id", "title", "description", "category", "frequency", "match_score"];

pub fn csv_rows(rows: &ReportRows) -> anyhow::Result<String> {
    match rows {
        ReportRows::Detail(rows) => write_csv(rows, DETAIL_COLUMNS),
        ReportRows::JobTitles(rows) => write_csv(rows, JOB_TITLE_COLUMNS),
        ReportRows::Trainings(rows) => write_csv(rows, TRAINING_COLUMNS),
    }
}

fn write_csv<T: Serialize>(rows: &[T], columns: &[&str]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // serde writes the header with the first record; an empty report still gets one.
    if rows.is_empty() {
        writer.write_record(columns)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv output: {}", err.error()))?;
    Ok(String::from_utf8(bytes)?)
}

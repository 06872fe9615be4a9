use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::compliance;
use crate::intent::Intent;
use crate::models::{
    AssignmentRecord, Category, CompletionRecord, ComplianceStatus, Frequency, JobTitle,
    SubjectProfile,
};
use crate::response::ReportRows;

pub const MAX_ROWS: usize = 200;
pub const UNASSIGNED_JOB_TITLE: &str = "Unassigned";

/// One (subject, training) assignment with its derived status.
#[derive(Debug, Clone, Serialize)]
pub struct DetailRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub net_id: String,
    pub job_title: String,
    pub training_id: Uuid,
    pub training_title: String,
    pub category: Category,
    pub frequency: Frequency,
    pub status: ComplianceStatus,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub next_due_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub total_assignments: usize,
    pub compliant: usize,
    pub overdue: usize,
    pub due_soon: usize,
    pub not_started: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobTitleBreakdown {
    pub job_title: String,
    pub total: usize,
    pub compliant: usize,
    pub overdue: usize,
    pub due_soon: usize,
    pub not_started: usize,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct StatusCounts {
    total: usize,
    compliant: usize,
    overdue: usize,
    due_soon: usize,
    not_started: usize,
}

impl StatusCounts {
    fn record(&mut self, status: ComplianceStatus) {
        self.total += 1;
        match status {
            ComplianceStatus::Compliant => self.compliant += 1,
            ComplianceStatus::Overdue => self.overdue += 1,
            ComplianceStatus::DueSoon => self.due_soon += 1,
            ComplianceStatus::NotStarted => self.not_started += 1,
        }
    }

    fn completion_rate(&self) -> f64 {
        completion_rate(self.compliant, self.total)
    }
}

/// Percentage of compliant assignments, rounded to one decimal.
pub fn completion_rate(compliant: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (compliant as f64 * 1000.0 / total as f64).round() / 10.0
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub rows: Vec<DetailRow>,
    pub highlights: Highlights,
    pub breakdown: Vec<JobTitleBreakdown>,
}

pub fn assemble(
    subjects: &[SubjectProfile],
    job_titles: &[JobTitle],
    assignments: &[AssignmentRecord],
    completions: &[CompletionRecord],
    now: DateTime<Utc>,
    due_soon_days: u32,
) -> Assembly {
    let title_names: HashMap<Uuid, &str> = job_titles
        .iter()
        .map(|title| (title.id, title.name.as_str()))
        .collect();
    let latest = compliance::latest_approved(completions);

    let mut by_subject: HashMap<Uuid, Vec<&AssignmentRecord>> = HashMap::new();
    let mut seen: HashSet<(Uuid, Uuid)> = HashSet::new();
    for assignment in assignments {
        if seen.insert((assignment.user_id, assignment.training.id)) {
            by_subject.entry(assignment.user_id).or_default().push(assignment);
        }
    }

    let mut rows = Vec::new();
    for subject in subjects {
        let Some(assigned) = by_subject.get(&subject.id) else {
            continue;
        };
        let job_title = subject
            .job_title_id
            .and_then(|id| title_names.get(&id).copied())
            .unwrap_or(UNASSIGNED_JOB_TITLE);

        for assignment in assigned {
            let training = &assignment.training;
            let last_completed_at = latest
                .get(&(subject.id, training.id))
                .map(|completion| completion.effective_at());
            let outcome =
                compliance::evaluate(training.frequency, last_completed_at, now, due_soon_days);

            rows.push(DetailRow {
                user_id: subject.id,
                full_name: subject.full_name.clone(),
                net_id: subject.net_id.clone(),
                job_title: job_title.to_string(),
                training_id: training.id,
                training_title: training.title.clone(),
                category: training.category,
                frequency: training.frequency,
                status: outcome.status,
                last_completed_at,
                next_due_at: outcome.next_due_at,
            });
        }
    }

    let highlights = summarize(&rows);
    let breakdown = breakdown_by_job_title(&rows);

    Assembly {
        rows,
        highlights,
        breakdown,
    }
}

pub fn summarize(rows: &[DetailRow]) -> Highlights {
    let mut counts = StatusCounts::default();
    for row in rows {
        counts.record(row.status);
    }

    Highlights {
        total_assignments: counts.total,
        compliant: counts.compliant,
        overdue: counts.overdue,
        due_soon: counts.due_soon,
        not_started: counts.not_started,
        completion_rate: counts.completion_rate(),
    }
}

/// Per-job-title counts, worst overdue first.
pub fn breakdown_by_job_title(rows: &[DetailRow]) -> Vec<JobTitleBreakdown> {
    let mut groups: HashMap<&str, StatusCounts> = HashMap::new();
    for row in rows {
        groups.entry(row.job_title.as_str()).or_default().record(row.status);
    }

    let mut breakdown: Vec<JobTitleBreakdown> = groups
        .into_iter()
        .map(|(job_title, counts)| JobTitleBreakdown {
            job_title: job_title.to_string(),
            total: counts.total,
            compliant: counts.compliant,
            overdue: counts.overdue,
            due_soon: counts.due_soon,
            not_started: counts.not_started,
            completion_rate: counts.completion_rate(),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.overdue
            .cmp(&a.overdue)
            .then_with(|| a.job_title.cmp(&b.job_title))
    });
    breakdown
}

pub fn select_rows(intent: Intent, assembly: Assembly) -> ReportRows {
    match intent {
        Intent::Overdue => ReportRows::Detail(by_next_due(assembly.rows, ComplianceStatus::Overdue)),
        Intent::DueSoon => ReportRows::Detail(by_next_due(assembly.rows, ComplianceStatus::DueSoon)),
        Intent::CompletionRate | Intent::ByJobTitle => ReportRows::JobTitles(assembly.breakdown),
        Intent::Summary | Intent::TrainingSearch => {
            let mut rows = assembly.rows;
            rows.sort_by(|a, b| {
                a.status
                    .severity_rank()
                    .cmp(&b.status.severity_rank())
                    .then_with(|| a.full_name.cmp(&b.full_name))
                    .then_with(|| a.training_title.cmp(&b.training_title))
            });
            rows.truncate(MAX_ROWS);
            ReportRows::Detail(rows)
        }
    }
}

fn by_next_due(rows: Vec<DetailRow>, status: ComplianceStatus) -> Vec<DetailRow> {
    let mut selected: Vec<DetailRow> = rows.into_iter().filter(|row| row.status == status).collect();
    selected.sort_by(|a, b| {
        a.next_due_at
            .cmp(&b.next_due_at)
            .then_with(|| a.full_name.cmp(&b.full_name))
            .then_with(|| a.training_title.cmp(&b.training_title))
    });
    selected.truncate(MAX_ROWS);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Months, TimeZone};

    use crate::models::{CompletionStatus, TrainingDefinition};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn subject(name: &str, job_title_id: Option<Uuid>) -> SubjectProfile {
        SubjectProfile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            net_id: name.to_lowercase().replace(' ', "."),
            job_title_id,
            is_active: true,
        }
    }

    fn training(title: &str, frequency: Frequency) -> TrainingDefinition {
        TrainingDefinition {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            category: Category::Sop,
            frequency,
        }
    }

    fn approved(user_id: Uuid, training_id: Uuid, at: DateTime<Utc>) -> CompletionRecord {
        CompletionRecord {
            user_id,
            training_id,
            completed_at: at,
            approved_at: Some(at),
            status: CompletionStatus::Approved,
        }
    }

    fn row(name: &str, title: &str, status: ComplianceStatus, next_due_at: Option<DateTime<Utc>>) -> DetailRow {
        DetailRow {
            user_id: Uuid::new_v4(),
            full_name: name.to_string(),
            net_id: name.to_lowercase(),
            job_title: title.to_string(),
            training_id: Uuid::new_v4(),
            training_title: "Safety".to_string(),
            category: Category::Sop,
            frequency: Frequency::Annual,
            status,
            last_completed_at: None,
            next_due_at,
        }
    }

    #[test]
    fn completion_rate_rounds_to_one_decimal() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 3), 33.3);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(4, 4), 100.0);
    }

    #[test]
    fn assembles_rows_with_status_and_job_title() {
        let analyst = JobTitle {
            id: Uuid::new_v4(),
            name: "Analyst".to_string(),
        };
        let avery = subject("Avery Lee", Some(analyst.id));
        let jules = subject("Jules Moreno", None);
        let annual = training("Fire Safety", Frequency::Annual);
        let once = training("Orientation", Frequency::OneTime);

        let assignments = vec![
            AssignmentRecord { user_id: avery.id, training: annual.clone() },
            AssignmentRecord { user_id: avery.id, training: once.clone() },
            AssignmentRecord { user_id: jules.id, training: annual.clone() },
            // Duplicate assignment rows collapse into one.
            AssignmentRecord { user_id: jules.id, training: annual.clone() },
        ];
        let fourteen_months_ago = now().checked_sub_months(Months::new(14)).unwrap();
        let completions = vec![
            approved(avery.id, annual.id, fourteen_months_ago),
            approved(avery.id, once.id, now() - Duration::days(400)),
        ];

        let assembly = assemble(
            &[avery.clone(), jules.clone()],
            &[analyst],
            &assignments,
            &completions,
            now(),
            60,
        );

        assert_eq!(assembly.rows.len(), 3);
        assert_eq!(assembly.highlights.total_assignments, 3);
        assert_eq!(assembly.highlights.overdue, 1);
        assert_eq!(assembly.highlights.compliant, 1);
        assert_eq!(assembly.highlights.not_started, 1);
        assert_eq!(assembly.highlights.completion_rate, 33.3);

        let overdue = assembly
            .rows
            .iter()
            .find(|row| row.status == ComplianceStatus::Overdue)
            .unwrap();
        assert_eq!(overdue.user_id, avery.id);
        assert_eq!(overdue.job_title, "Analyst");
        assert_eq!(overdue.last_completed_at, Some(fourteen_months_ago));

        let unassigned = assembly.rows.iter().find(|row| row.user_id == jules.id).unwrap();
        assert_eq!(unassigned.job_title, UNASSIGNED_JOB_TITLE);
        assert_eq!(unassigned.status, ComplianceStatus::NotStarted);
    }

    #[test]
    fn assignments_outside_scope_are_ignored() {
        let inside = subject("Avery Lee", None);
        let outside = subject("Someone Else", None);
        let annual = training("Fire Safety", Frequency::Annual);
        let assignments = vec![
            AssignmentRecord { user_id: inside.id, training: annual.clone() },
            AssignmentRecord { user_id: outside.id, training: annual },
        ];

        let assembly = assemble(&[inside], &[], &assignments, &[], now(), 60);
        assert_eq!(assembly.rows.len(), 1);
    }

    #[test]
    fn empty_scope_has_zero_rate() {
        let assembly = assemble(&[], &[], &[], &[], now(), 60);
        assert_eq!(assembly.highlights, Highlights::default());
        assert!(assembly.breakdown.is_empty());
    }

    #[test]
    fn breakdown_sorts_by_overdue_then_title() {
        let rows = vec![
            row("A", "Nurse", ComplianceStatus::Compliant, None),
            row("B", "Nurse", ComplianceStatus::Compliant, None),
            row("C", "Clerk", ComplianceStatus::Compliant, None),
            row("D", "Clerk", ComplianceStatus::Overdue, Some(now())),
            row("E", "Aide", ComplianceStatus::DueSoon, Some(now())),
        ];

        let breakdown = breakdown_by_job_title(&rows);
        let titles: Vec<&str> = breakdown.iter().map(|b| b.job_title.as_str()).collect();
        assert_eq!(titles, vec!["Clerk", "Aide", "Nurse"]);
        assert_eq!(breakdown[0].completion_rate, 50.0);
        assert_eq!(breakdown[0].overdue, 1);
        assert_eq!(breakdown[1].completion_rate, 0.0);
        assert_eq!(breakdown[2].completion_rate, 100.0);
        assert_eq!(breakdown[2].total, 2);
    }

    #[test]
    fn overdue_rows_sorted_soonest_first_and_capped() {
        let mut rows = Vec::new();
        for i in 0..250 {
            rows.push(row(
                &format!("User {i:03}"),
                "Clerk",
                ComplianceStatus::Overdue,
                Some(now() - Duration::days(i)),
            ));
        }
        rows.push(row("Fine", "Clerk", ComplianceStatus::Compliant, None));
        let assembly = Assembly {
            highlights: summarize(&rows),
            breakdown: breakdown_by_job_title(&rows),
            rows,
        };

        let ReportRows::Detail(selected) = select_rows(Intent::Overdue, assembly) else {
            panic!("expected detail rows");
        };
        assert_eq!(selected.len(), MAX_ROWS);
        assert!(selected.iter().all(|r| r.status == ComplianceStatus::Overdue));
        assert!(selected.windows(2).all(|w| w[0].next_due_at <= w[1].next_due_at));
        assert_eq!(selected[0].full_name, "User 249");
    }

    #[test]
    fn due_soon_rows_filtered_sorted_and_capped() {
        let mut rows = Vec::new();
        for i in 0..230 {
            rows.push(row(
                &format!("User {i:03}"),
                "Clerk",
                ComplianceStatus::DueSoon,
                Some(now() + Duration::days(230 - i)),
            ));
        }
        rows.push(row("Late", "Clerk", ComplianceStatus::Overdue, Some(now() - Duration::days(400))));
        rows.push(row("Fresh", "Clerk", ComplianceStatus::NotStarted, None));
        let assembly = Assembly {
            highlights: summarize(&rows),
            breakdown: breakdown_by_job_title(&rows),
            rows,
        };

        let ReportRows::Detail(selected) = select_rows(Intent::DueSoon, assembly) else {
            panic!("expected detail rows");
        };
        assert_eq!(selected.len(), MAX_ROWS);
        assert!(selected.iter().all(|r| r.status == ComplianceStatus::DueSoon));
        assert!(selected.windows(2).all(|w| w[0].next_due_at <= w[1].next_due_at));
        assert_eq!(selected[0].full_name, "User 229");
    }

    #[test]
    fn summary_rows_follow_severity_rank() {
        let rows = vec![
            row("A", "Clerk", ComplianceStatus::Compliant, None),
            row("B", "Clerk", ComplianceStatus::NotStarted, None),
            row("C", "Clerk", ComplianceStatus::DueSoon, Some(now())),
            row("D", "Clerk", ComplianceStatus::Overdue, Some(now())),
        ];
        let assembly = Assembly {
            highlights: summarize(&rows),
            breakdown: breakdown_by_job_title(&rows),
            rows,
        };

        let ReportRows::Detail(selected) = select_rows(Intent::Summary, assembly) else {
            panic!("expected detail rows");
        };
        let statuses: Vec<ComplianceStatus> = selected.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ComplianceStatus::Overdue,
                ComplianceStatus::DueSoon,
                ComplianceStatus::NotStarted,
                ComplianceStatus::Compliant,
            ]
        );
    }

    #[test]
    fn rate_intents_return_breakdown() {
        let rows = vec![row("A", "Clerk", ComplianceStatus::Compliant, None)];
        let assembly = Assembly {
            highlights: summarize(&rows),
            breakdown: breakdown_by_job_title(&rows),
            rows,
        };
        assert!(matches!(
            select_rows(Intent::CompletionRate, assembly),
            ReportRows::JobTitles(ref b) if b.len() == 1
        ));
    }
}

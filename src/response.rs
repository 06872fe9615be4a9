use serde::Serialize;

use crate::intent::{Intent, ReportQuery};
use crate::models::Role;
use crate::report::{DetailRow, Highlights, JobTitleBreakdown};
use crate::search::TrainingMatch;

const REPORT_PROMPTS: &[&str] = &[
    "Show overdue trainings",
    "What is due soon in the next 30 days?",
    "Show completion rate by job title",
];

const SEARCH_PROMPTS: &[&str] = &[
    "Find trainings about safety",
    "Show overdue trainings",
];

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Detail(Vec<DetailRow>),
    JobTitles(Vec<JobTitleBreakdown>),
    Trainings(Vec<TrainingMatch>),
}

impl ReportRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Detail(rows) => rows.len(),
            Self::JobTitles(rows) => rows.len(),
            Self::Trainings(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeInfo {
    pub role: Role,
    pub users: usize,
    #[serde(rename = "dueSoonDays")]
    pub due_soon_days: u32,
    pub net_id_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub intent: Intent,
    pub summary: String,
    pub scope: ScopeInfo,
    pub highlights: Highlights,
    pub rows: ReportRows,
    pub suggested_prompts: Vec<String>,
}

fn prompts(list: &[&str]) -> Vec<String> {
    list.iter().map(|prompt| prompt.to_string()).collect()
}

fn scope_info(query: &ReportQuery, role: Role, users: usize) -> ScopeInfo {
    ScopeInfo {
        role,
        users,
        due_soon_days: query.due_soon_days,
        net_id_filter: query.net_id.clone(),
    }
}

pub fn no_users_in_scope(query: &ReportQuery, role: Role) -> ReportResponse {
    ReportResponse {
        intent: query.intent,
        summary: "No users are in scope for this report.".to_string(),
        scope: scope_info(query, role, 0),
        highlights: Highlights::default(),
        rows: ReportRows::Detail(Vec::new()),
        suggested_prompts: prompts(REPORT_PROMPTS),
    }
}

pub fn training_search(query: &ReportQuery, role: Role, matches: Vec<TrainingMatch>) -> ReportResponse {
    let text = query.search_query.as_deref().unwrap_or_default();
    let summary = format!("Found {} training(s) matching \"{}\".", matches.len(), text);

    ReportResponse {
        intent: Intent::TrainingSearch,
        summary,
        scope: scope_info(query, role, 0),
        highlights: Highlights::default(),
        rows: ReportRows::Trainings(matches),
        suggested_prompts: prompts(SEARCH_PROMPTS),
    }
}

pub fn compliance_report(
    query: &ReportQuery,
    role: Role,
    users: usize,
    highlights: Highlights,
    rows: ReportRows,
) -> ReportResponse {
    let summary = match query.intent {
        Intent::Overdue => format!(
            "{} overdue assignment(s) across {} user(s) in scope.",
            highlights.overdue, users
        ),
        Intent::DueSoon => format!(
            "{} assignment(s) due within the next {} days.",
            highlights.due_soon, query.due_soon_days
        ),
        Intent::CompletionRate | Intent::ByJobTitle => format!(
            "Overall completion rate is {:.1}% across {} assignment(s) and {} job title(s).",
            highlights.completion_rate,
            highlights.total_assignments,
            rows.len()
        ),
        Intent::Summary | Intent::TrainingSearch => format!(
            "{} assignment(s) tracked for {} user(s): {} compliant, {} overdue, {} due soon, {} not started.",
            highlights.total_assignments,
            users,
            highlights.compliant,
            highlights.overdue,
            highlights.due_soon,
            highlights.not_started
        ),
    };

    ReportResponse {
        intent: query.intent,
        summary,
        scope: scope_info(query, role, users),
        highlights,
        rows,
        suggested_prompts: prompts(REPORT_PROMPTS),
    }
}

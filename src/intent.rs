use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const DEFAULT_DUE_SOON_DAYS: u32 = 60;
pub const MONTH_DUE_SOON_DAYS: u32 = 30;
pub const MAX_DUE_SOON_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TrainingSearch,
    ByJobTitle,
    CompletionRate,
    DueSoon,
    Overdue,
    Summary,
}

/// Classified prompt plus the parameters pulled out of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportQuery {
    pub intent: Intent,
    pub due_soon_days: u32,
    pub net_id: Option<String>,
    pub search_query: Option<String>,
}

static TRAINING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*training:\s*(.*)$").expect("valid prefix pattern"));

static SEARCH_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\b(?:find|search(?:\s+for)?|look\s*up)\s+trainings?\b(?:\s+(?:about|for|with)\b)?\s*(.*)$",
    )
    .expect("valid search pattern")
});

static DAY_WINDOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]+)\s*-?\s*day").expect("valid day pattern"));

static NET_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnetid\s+([a-z0-9._-]+)").expect("valid net id pattern")
});

type Rule = (fn(&str) -> bool, Intent);

// Evaluated top to bottom; prompts routinely satisfy more than one rule.
const RULES: &[Rule] = &[
    (is_training_search, Intent::TrainingSearch),
    (mentions_job_title, Intent::ByJobTitle),
    (mentions_completion_rate, Intent::CompletionRate),
    (mentions_due_soon, Intent::DueSoon),
    (mentions_overdue, Intent::Overdue),
];

pub fn classify(prompt: &str) -> ReportQuery {
    let normalized = normalize(prompt);
    let intent = RULES
        .iter()
        .find(|(matches, _)| matches(&normalized))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::Summary);

    let search_query = (intent == Intent::TrainingSearch).then(|| extract_search_query(prompt));

    ReportQuery {
        intent,
        due_soon_days: due_soon_days(&normalized),
        net_id: extract_net_id(prompt),
        search_query,
    }
}

fn normalize(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_training_search(prompt: &str) -> bool {
    TRAINING_PREFIX.is_match(prompt) || SEARCH_PHRASE.is_match(prompt)
}

fn mentions_job_title(prompt: &str) -> bool {
    ["by job title", "job title breakdown", "title breakdown"]
        .iter()
        .any(|phrase| prompt.contains(phrase))
}

fn mentions_completion_rate(prompt: &str) -> bool {
    prompt.contains("completion rate") || prompt.contains("compliance rate")
}

fn mentions_due_soon(prompt: &str) -> bool {
    prompt.contains("due soon")
}

fn mentions_overdue(prompt: &str) -> bool {
    prompt.contains("overdue") || prompt.contains("not compliant")
}

pub fn due_soon_days(prompt: &str) -> u32 {
    if let Some(captures) = DAY_WINDOW.captures(prompt) {
        // Digits that overflow u64 are still "a lot of days".
        let days = captures[1].parse::<u64>().unwrap_or(u64::MAX);
        return days.clamp(1, u64::from(MAX_DUE_SOON_DAYS)) as u32;
    }

    let lowered = prompt.to_lowercase();
    if lowered.contains("this month") || lowered.contains("next month") {
        MONTH_DUE_SOON_DAYS
    } else {
        DEFAULT_DUE_SOON_DAYS
    }
}

pub fn extract_net_id(prompt: &str) -> Option<String> {
    NET_ID
        .captures(prompt)
        .map(|captures| captures[1].to_string())
}

pub fn extract_search_query(prompt: &str) -> String {
    let captured = TRAINING_PREFIX
        .captures(prompt)
        .or_else(|| SEARCH_PHRASE.captures(prompt))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str());

    match captured {
        Some(text) => text
            .trim()
            .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!'))
            .trim()
            .to_string(),
        None => prompt.trim().to_string(),
    }
}

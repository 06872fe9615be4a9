use std::collections::HashMap;

use chrono::{DateTime, Duration, Months, Utc};
use uuid::Uuid;

use crate::models::{CompletionRecord, CompletionStatus, ComplianceStatus, Frequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOutcome {
    pub status: ComplianceStatus,
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Derives the compliance status of one assignment.
///
/// Recurring trainings come due a fixed number of calendar months after the
/// last approved completion. Month addition clamps to the last valid day of
/// the target month, so Aug 31 + 6 months is Feb 28 (or 29).
pub fn evaluate(
    frequency: Frequency,
    last_completed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    due_soon_days: u32,
) -> StatusOutcome {
    let Some(completed_at) = last_completed_at else {
        return StatusOutcome {
            status: ComplianceStatus::NotStarted,
            next_due_at: None,
        };
    };

    let Some(months) = frequency.recurrence_months() else {
        return StatusOutcome {
            status: ComplianceStatus::Compliant,
            next_due_at: None,
        };
    };

    let Some(next_due_at) = completed_at.checked_add_months(Months::new(months)) else {
        // Past the representable range; nothing can be due before then.
        return StatusOutcome {
            status: ComplianceStatus::Compliant,
            next_due_at: None,
        };
    };

    let status = if next_due_at < now {
        ComplianceStatus::Overdue
    } else if next_due_at <= now + Duration::days(i64::from(due_soon_days)) {
        ComplianceStatus::DueSoon
    } else {
        ComplianceStatus::Compliant
    };

    StatusOutcome {
        status,
        next_due_at: Some(next_due_at),
    }
}

/// Latest approved completion per (subject, training), independent of input order.
pub fn latest_approved(
    completions: &[CompletionRecord],
) -> HashMap<(Uuid, Uuid), &CompletionRecord> {
    let mut latest: HashMap<(Uuid, Uuid), &CompletionRecord> = HashMap::new();

    for completion in completions
        .iter()
        .filter(|completion| completion.status == CompletionStatus::Approved)
    {
        let key = (completion.user_id, completion.training_id);
        let newer = latest
            .get(&key)
            .map_or(true, |current| recency_key(completion) > recency_key(current));
        if newer {
            latest.insert(key, completion);
        }
    }

    latest
}

fn recency_key(completion: &CompletionRecord) -> (DateTime<Utc>, DateTime<Utc>) {
    (completion.effective_at(), completion.completed_at)
}

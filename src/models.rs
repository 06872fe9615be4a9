use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Employee,
    Supervisor,
    Coordinator,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "supervisor" => Ok(Self::Supervisor),
            "coordinator" => Ok(Self::Coordinator),
            other => bail!("unknown role '{other}'"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Employee => "employee",
            Self::Supervisor => "supervisor",
            Self::Coordinator => "coordinator",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Onboarding,
    OnTheJob,
    Sop,
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "onboarding" => Ok(Self::Onboarding),
            "on_the_job" => Ok(Self::OnTheJob),
            "sop" => Ok(Self::Sop),
            other => bail!("unknown training category '{other}'"),
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::OnTheJob => "on_the_job",
            Self::Sop => "sop",
        }
    }
}

/// How often a training has to be repeated to stay compliant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    OneTime,
    Annual,
    SemiAnnual,
    AsNeeded,
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "one_time" => Ok(Self::OneTime),
            "annual" => Ok(Self::Annual),
            "semi_annual" => Ok(Self::SemiAnnual),
            "as_needed" => Ok(Self::AsNeeded),
            other => bail!("unknown training frequency '{other}'"),
        }
    }
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Annual => "annual",
            Self::SemiAnnual => "semi_annual",
            Self::AsNeeded => "as_needed",
        }
    }

    /// Months between required completions, `None` for non-recurring trainings.
    pub fn recurrence_months(&self) -> Option<u32> {
        match self {
            Self::Annual => Some(12),
            Self::SemiAnnual => Some(6),
            Self::OneTime | Self::AsNeeded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Pending,
    Approved,
    Rejected,
}

impl FromStr for CompletionStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => bail!("unknown completion status '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    Overdue,
    DueSoon,
    NotStarted,
}

impl ComplianceStatus {
    /// Sort rank for the summary listing, most urgent first.
    pub fn severity_rank(&self) -> u8 {
        match self {
            Self::Overdue => 0,
            Self::DueSoon => 1,
            Self::NotStarted => 2,
            Self::Compliant => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::Overdue => "overdue",
            Self::DueSoon => "due_soon",
            Self::NotStarted => "not_started",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubjectProfile {
    pub id: Uuid,
    pub full_name: String,
    pub net_id: String,
    pub job_title_id: Option<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct JobTitle {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TrainingDefinition {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub frequency: Frequency,
}

/// A training required for a subject, joined to the training's metadata.
#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub user_id: Uuid,
    pub training: TrainingDefinition,
}

#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub user_id: Uuid,
    pub training_id: Uuid,
    pub completed_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub status: CompletionStatus,
}

impl CompletionRecord {
    /// Timestamp that counts toward compliance: approval time, else completion time.
    pub fn effective_at(&self) -> DateTime<Utc> {
        self.approved_at.unwrap_or(self.completed_at)
    }
}

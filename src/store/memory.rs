use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    AssignmentRecord, Category, CompletionRecord, CompletionStatus, Frequency, JobTitle, Role,
    SubjectProfile, TrainingDefinition,
};
use crate::store::{ComplianceStore, ProfileFilter};

/// In-process store for exercising the pipeline without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    pub profiles: Vec<SubjectProfile>,
    pub roles: HashMap<Uuid, Role>,
    pub supervisor_links: Vec<(Uuid, Uuid)>,
    pub job_titles: Vec<JobTitle>,
    pub trainings: Vec<TrainingDefinition>,
    pub assignments: Vec<(Uuid, Uuid)>,
    pub completions: Vec<CompletionRecord>,
    pub fail_completions: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(
        &mut self,
        full_name: &str,
        net_id: &str,
        job_title_id: Option<Uuid>,
        role: Option<Role>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.profiles.push(SubjectProfile {
            id,
            full_name: full_name.to_string(),
            net_id: net_id.to_string(),
            job_title_id,
            is_active: true,
        });
        if let Some(role) = role {
            self.roles.insert(id, role);
        }
        id
    }

    pub fn add_job_title(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.job_titles.push(JobTitle {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn add_training(
        &mut self,
        title: &str,
        description: &str,
        category: Category,
        frequency: Frequency,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.trainings.push(TrainingDefinition {
            id,
            title: title.to_string(),
            description: description.to_string(),
            category,
            frequency,
        });
        id
    }

    pub fn assign(&mut self, user_id: Uuid, training_id: Uuid) {
        self.assignments.push((user_id, training_id));
    }

    pub fn supervise(&mut self, supervisor_id: Uuid, employee_id: Uuid) {
        self.supervisor_links.push((supervisor_id, employee_id));
    }

    pub fn complete(&mut self, user_id: Uuid, training_id: Uuid, approved_at: DateTime<Utc>) {
        self.completions.push(CompletionRecord {
            user_id,
            training_id,
            completed_at: approved_at,
            approved_at: Some(approved_at),
            status: CompletionStatus::Approved,
        });
    }

    fn active_where(&self, keep: impl Fn(&SubjectProfile) -> bool) -> Vec<SubjectProfile> {
        let mut profiles: Vec<SubjectProfile> = self
            .profiles
            .iter()
            .filter(|profile| profile.is_active && keep(profile))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        profiles
    }
}

#[async_trait]
impl ComplianceStore for MemoryStore {
    async fn resolve_caller(&self, credential: &str) -> anyhow::Result<Option<Uuid>> {
        let credential = credential.trim();
        let id = match Uuid::parse_str(credential) {
            Ok(id) => self.profiles.iter().find(|p| p.id == id).map(|p| p.id),
            Err(_) => self
                .profiles
                .iter()
                .find(|p| p.net_id.eq_ignore_ascii_case(credential))
                .map(|p| p.id),
        };
        Ok(id)
    }

    async fn fetch_role(&self, user_id: Uuid) -> anyhow::Result<Option<Role>> {
        Ok(self.roles.get(&user_id).copied())
    }

    async fn fetch_profiles(&self, filter: ProfileFilter) -> anyhow::Result<Vec<SubjectProfile>> {
        let profiles = match filter {
            ProfileFilter::All => self.active_where(|_| true),
            ProfileFilter::Ids(ids) => self.active_where(|p| ids.contains(&p.id)),
            ProfileFilter::SupervisedBy(supervisor_id) => self.active_where(|p| {
                self.supervisor_links
                    .iter()
                    .any(|(supervisor, employee)| *supervisor == supervisor_id && *employee == p.id)
            }),
        };
        Ok(profiles)
    }

    async fn fetch_job_titles(&self) -> anyhow::Result<Vec<JobTitle>> {
        Ok(self.job_titles.clone())
    }

    async fn fetch_trainings(&self) -> anyhow::Result<Vec<TrainingDefinition>> {
        Ok(self.trainings.clone())
    }

    async fn fetch_assignments(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<AssignmentRecord>> {
        let mut assignments = Vec::new();
        for (user_id, training_id) in &self.assignments {
            if !user_ids.contains(user_id) {
                continue;
            }
            let Some(training) = self.trainings.iter().find(|t| t.id == *training_id) else {
                bail!("assignment references unknown training {training_id}");
            };
            assignments.push(AssignmentRecord {
                user_id: *user_id,
                training: training.clone(),
            });
        }
        Ok(assignments)
    }

    async fn fetch_approved_completions(
        &self,
        user_ids: &[Uuid],
    ) -> anyhow::Result<Vec<CompletionRecord>> {
        if self.fail_completions {
            bail!("completions table unavailable");
        }
        let mut completions: Vec<CompletionRecord> = self
            .completions
            .iter()
            .filter(|c| c.status == CompletionStatus::Approved && user_ids.contains(&c.user_id))
            .cloned()
            .collect();
        completions.sort_by(|a, b| b.effective_at().cmp(&a.effective_at()));
        Ok(completions)
    }
}

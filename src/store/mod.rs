#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    AssignmentRecord, CompletionRecord, JobTitle, Role, SubjectProfile, TrainingDefinition,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileFilter {
    All,
    Ids(Vec<Uuid>),
    SupervisedBy(Uuid),
}

/// Source of profiles, roles, catalog, assignments and completions.
///
/// Implementations never write. Profile fetches return active profiles only.
#[async_trait]
pub trait ComplianceStore: Send + Sync {
    /// Resolves an already-authenticated credential (profile id or net id) to an identity.
    async fn resolve_caller(&self, credential: &str) -> anyhow::Result<Option<Uuid>>;

    async fn fetch_role(&self, user_id: Uuid) -> anyhow::Result<Option<Role>>;

    async fn fetch_profiles(&self, filter: ProfileFilter) -> anyhow::Result<Vec<SubjectProfile>>;

    async fn fetch_job_titles(&self) -> anyhow::Result<Vec<JobTitle>>;

    async fn fetch_trainings(&self) -> anyhow::Result<Vec<TrainingDefinition>>;

    async fn fetch_assignments(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<AssignmentRecord>>;

    /// Approved completions for the given subjects, newest first.
    async fn fetch_approved_completions(
        &self,
        user_ids: &[Uuid],
    ) -> anyhow::Result<Vec<CompletionRecord>>;
}

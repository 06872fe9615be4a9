use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AssignmentRecord, CompletionRecord, JobTitle, Role, SubjectProfile, TrainingDefinition,
};
use crate::store::{ComplianceStore, ProfileFilter};

const PROFILE_COLUMNS: &str = "p.id, p.full_name, p.net_id, p.job_title_id, p.is_active";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Self { pool })
    }
}

fn profile_from_row(row: &PgRow) -> anyhow::Result<SubjectProfile> {
    Ok(SubjectProfile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        net_id: row.try_get("net_id")?,
        job_title_id: row.try_get("job_title_id")?,
        is_active: row.try_get("is_active")?,
    })
}

fn training_from_row(row: &PgRow) -> anyhow::Result<TrainingDefinition> {
    let category: String = row.try_get("category")?;
    let frequency: String = row.try_get("frequency")?;
    let description: Option<String> = row.try_get("description")?;

    Ok(TrainingDefinition {
        id: row.try_get("training_id")?,
        title: row.try_get("title")?,
        description: description.unwrap_or_default(),
        category: category.parse()?,
        frequency: frequency.parse()?,
    })
}

#[async_trait]
impl ComplianceStore for PgStore {
    async fn resolve_caller(&self, credential: &str) -> anyhow::Result<Option<Uuid>> {
        let row = match Uuid::parse_str(credential.trim()) {
            Ok(id) => sqlx::query("SELECT id FROM profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("failed to look up caller profile")?,
            Err(_) => sqlx::query("SELECT id FROM profiles WHERE lower(net_id) = lower($1)")
                .bind(credential.trim())
                .fetch_optional(&self.pool)
                .await
                .context("failed to look up caller net id")?,
        };

        Ok(row.map(|row| row.get("id")))
    }

    async fn fetch_role(&self, user_id: Uuid) -> anyhow::Result<Option<Role>> {
        let row = sqlx::query("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch caller role")?;

        match row {
            Some(row) => {
                let role: String = row.try_get("role")?;
                Ok(Some(role.parse()?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_profiles(&self, filter: ProfileFilter) -> anyhow::Result<Vec<SubjectProfile>> {
        let rows = match filter {
            ProfileFilter::All => {
                let query = format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles p \
                     WHERE p.is_active ORDER BY p.full_name"
                );
                sqlx::query(&query).fetch_all(&self.pool).await
            }
            ProfileFilter::Ids(ids) => {
                let query = format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles p \
                     WHERE p.is_active AND p.id = ANY($1) ORDER BY p.full_name"
                );
                sqlx::query(&query).bind(ids).fetch_all(&self.pool).await
            }
            ProfileFilter::SupervisedBy(supervisor_id) => {
                let query = format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles p \
                     JOIN supervisor_employees se ON se.employee_id = p.id \
                     WHERE p.is_active AND se.supervisor_id = $1 ORDER BY p.full_name"
                );
                sqlx::query(&query)
                    .bind(supervisor_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("failed to fetch profiles")?;

        rows.iter().map(profile_from_row).collect()
    }

    async fn fetch_job_titles(&self) -> anyhow::Result<Vec<JobTitle>> {
        let rows = sqlx::query("SELECT id, name FROM job_titles")
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch job titles")?;

        let mut titles = Vec::new();
        for row in rows {
            titles.push(JobTitle {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            });
        }

        Ok(titles)
    }

    async fn fetch_trainings(&self) -> anyhow::Result<Vec<TrainingDefinition>> {
        let rows = sqlx::query(
            "SELECT t.id AS training_id, t.title, t.description, t.category, t.frequency \
             FROM trainings t",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch trainings")?;

        rows.iter().map(training_from_row).collect()
    }

    async fn fetch_assignments(&self, user_ids: &[Uuid]) -> anyhow::Result<Vec<AssignmentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT a.user_id, t.id AS training_id, t.title, t.description, t.category, t.frequency
            FROM training_assignments a
            JOIN trainings t ON t.id = a.training_id
            WHERE a.user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch assignments")?;

        let mut assignments = Vec::new();
        for row in rows {
            assignments.push(AssignmentRecord {
                user_id: row.try_get("user_id")?,
                training: training_from_row(&row)?,
            });
        }

        Ok(assignments)
    }

    async fn fetch_approved_completions(
        &self,
        user_ids: &[Uuid],
    ) -> anyhow::Result<Vec<CompletionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, training_id, completed_at, approved_at, status
            FROM training_completions
            WHERE user_id = ANY($1) AND status = 'approved'
            ORDER BY COALESCE(approved_at, completed_at) DESC
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .context("failed to fetch completions")?;

        let mut completions = Vec::new();
        for row in rows {
            let status: String = row.try_get("status")?;
            completions.push(CompletionRecord {
                user_id: row.try_get("user_id")?,
                training_id: row.try_get("training_id")?,
                completed_at: row.try_get("completed_at")?,
                approved_at: row.try_get("approved_at")?,
                status: status.parse()?,
            });
        }

        Ok(completions)
    }
}

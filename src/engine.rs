use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::error::{ReportError, Result};
use crate::intent::{self, Intent};
use crate::report;
use crate::response::{self, ReportResponse};
use crate::scope;
use crate::search;
use crate::store::ComplianceStore;

pub const MAX_PROMPT_CHARS: usize = 2000;

#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Identity handed over by the authentication layer: profile id or net id.
    pub credential: Option<String>,
    pub prompt: String,
}

fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(ReportError::invalid("prompt must not be empty"));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ReportError::invalid(format!(
            "prompt exceeds {MAX_PROMPT_CHARS} characters"
        )));
    }
    Ok(())
}

#[instrument(skip(store, request), fields(prompt_len = request.prompt.len()))]
pub async fn run<S>(store: &S, request: &ReportRequest, now: DateTime<Utc>) -> Result<ReportResponse>
where
    S: ComplianceStore + ?Sized,
{
    let credential = request
        .credential
        .as_deref()
        .map(str::trim)
        .filter(|credential| !credential.is_empty())
        .ok_or(ReportError::Unauthenticated)?;
    let caller_id = store
        .resolve_caller(credential)
        .await?
        .ok_or(ReportError::Unauthenticated)?;
    validate_prompt(&request.prompt)?;

    let query = intent::classify(&request.prompt);
    let role = scope::effective_role(store.fetch_role(caller_id).await?);
    info!(intent = ?query.intent, %role, due_soon_days = query.due_soon_days, "classified prompt");

    if let Err(err) = scope::authorize_net_id_filter(role, query.net_id.as_deref()) {
        warn!(%caller_id, "rejected net id filter from employee");
        return Err(err);
    }

    if query.intent == Intent::TrainingSearch {
        let trainings = store.fetch_trainings().await?;
        let text = query.search_query.as_deref().unwrap_or_default();
        let matches = search::rank(&trainings, text);
        debug!(catalog = trainings.len(), matches = matches.len(), "ranked trainings");
        return Ok(response::training_search(&query, role, matches));
    }

    let subjects = scope::resolve_scope(store, caller_id, role, query.net_id.as_deref()).await?;
    if subjects.is_empty() {
        info!("no users in scope");
        return Ok(response::no_users_in_scope(&query, role));
    }

    let subject_ids: Vec<_> = subjects.iter().map(|subject| subject.id).collect();
    let (job_titles, assignments, completions) = tokio::try_join!(
        store.fetch_job_titles(),
        store.fetch_assignments(&subject_ids),
        store.fetch_approved_completions(&subject_ids),
    )?;
    debug!(
        subjects = subjects.len(),
        assignments = assignments.len(),
        completions = completions.len(),
        "fetched report data"
    );

    let assembly = report::assemble(
        &subjects,
        &job_titles,
        &assignments,
        &completions,
        now,
        query.due_soon_days,
    );
    let highlights = assembly.highlights.clone();
    let rows = report::select_rows(query.intent, assembly);

    Ok(response::compliance_report(
        &query,
        role,
        subjects.len(),
        highlights,
        rows,
    ))
}

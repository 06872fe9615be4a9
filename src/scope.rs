use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use crate::error::ReportError;
use crate::models::{Role, SubjectProfile};
use crate::store::{ComplianceStore, ProfileFilter};

/// Identities without a role row report as employees.
pub fn effective_role(stored: Option<Role>) -> Role {
    stored.unwrap_or_default()
}

/// Only supervisors and coordinators may narrow a report to another identity.
pub fn authorize_net_id_filter(role: Role, net_id: Option<&str>) -> Result<(), ReportError> {
    match (role, net_id) {
        (Role::Employee, Some(_)) => Err(ReportError::forbidden(
            "employees cannot filter reports by net id",
        )),
        _ => Ok(()),
    }
}

/// Active subjects the caller may report on, ordered by display name.
pub async fn resolve_scope<S>(
    store: &S,
    caller_id: Uuid,
    role: Role,
    net_id: Option<&str>,
) -> anyhow::Result<Vec<SubjectProfile>>
where
    S: ComplianceStore + ?Sized,
{
    let mut subjects = match role {
        Role::Coordinator => store.fetch_profiles(ProfileFilter::All).await?,
        Role::Supervisor => {
            let (own, supervised) = tokio::try_join!(
                store.fetch_profiles(ProfileFilter::Ids(vec![caller_id])),
                store.fetch_profiles(ProfileFilter::SupervisedBy(caller_id)),
            )?;
            dedupe(own.into_iter().chain(supervised))
        }
        Role::Employee => store.fetch_profiles(ProfileFilter::Ids(vec![caller_id])).await?,
    };

    subjects.retain(|subject| subject.is_active);
    if role != Role::Employee {
        if let Some(net_id) = net_id {
            subjects.retain(|subject| subject.net_id.eq_ignore_ascii_case(net_id));
        }
    }

    subjects.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.id.cmp(&b.id)));
    debug!(%caller_id, %role, subjects = subjects.len(), "resolved report scope");
    Ok(subjects)
}

fn dedupe(profiles: impl Iterator<Item = SubjectProfile>) -> Vec<SubjectProfile> {
    let mut by_id: HashMap<Uuid, SubjectProfile> = HashMap::new();
    for profile in profiles {
        by_id.entry(profile.id).or_insert(profile);
    }
    by_id.into_values().collect()
}

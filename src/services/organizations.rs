use crate::models::{Invite, NewInvite, Organization, OrganizationUpdate, Page};
use crate::services::backend::{BackendClient, BackendResult};
use crate::services::invalid;
use crate::services::pagination::{self, Cursor};

pub async fn list_organizations(
    backend: &BackendClient,
    token: &str,
    cursor: Option<&str>,
) -> BackendResult<Page<Organization>> {
    backend
        .get_page("organizations/", &[], cursor, Some(token))
        .await
}

/// Every organization the user can see, for the organization switcher.
pub async fn all_organizations(
    backend: &BackendClient,
    token: &str,
    max_pages: usize,
) -> BackendResult<Vec<Organization>> {
    pagination::walk(
        |cursor: Cursor| async move { list_organizations(backend, token, cursor.as_deref()).await },
        max_pages,
    )
    .await
}

pub async fn get_organization(backend: &BackendClient, token: &str, id: i64) -> BackendResult<Organization> {
    backend
        .get(&format!("organizations/{}/", id), Some(token))
        .await
}

pub async fn update_organization(
    backend: &BackendClient,
    token: &str,
    id: i64,
    update: &OrganizationUpdate,
) -> anyhow::Result<Organization> {
    if update.name.trim().is_empty() {
        invalid!("Organization name cannot be empty");
    }
    if update.plan.seats_used > update.plan.seats {
        invalid!(
            "Plan has {} seats but {} are in use",
            update.plan.seats,
            update.plan.seats_used
        );
    }
    let org = backend
        .put(&format!("organizations/{}/", id), update, Some(token))
        .await?;
    Ok(org)
}

pub async fn list_invites(
    backend: &BackendClient,
    token: &str,
    organization_id: i64,
) -> BackendResult<Page<Invite>> {
    let filters = [("organization", organization_id.to_string())];
    backend.get_page("invites/", &filters, None, Some(token)).await
}

pub async fn create_invite(backend: &BackendClient, token: &str, invite: &NewInvite) -> anyhow::Result<Invite> {
    let email = invite.email.trim();
    if email.is_empty() || !email.contains('@') {
        invalid!("Invalid email address");
    }
    let created = backend.post("invites/", invite, Some(token)).await?;
    Ok(created)
}

use super::{csrf_valid, issue_csrf, make_context};
use crate::models::{NewInvite, Organization, OrganizationUpdate, Plan};
use crate::services::{organizations, InvalidInput};
use crate::web::error::AppResult;
use crate::web::extractors::{AuthContext, CurrentUser};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct IndexQuery {
    cursor: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Query(query): Query<IndexQuery>,
) -> AppResult<Response> {
    let page =
        organizations::list_organizations(&state.backend, auth.token(), query.cursor.as_deref())
            .await?;

    let mut ctx = make_context(&state, Some(&auth.user), &jar);
    ctx.insert("organizations", &page.results);
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("cursor", &query.cursor);

    let html = state.templates.render("organizations/index.html", &ctx)?;
    Ok(Html(html).into_response())
}

#[derive(Deserialize)]
pub struct EditQuery {
    checkout: Option<String>,
}

async fn render_edit(
    state: &AppState,
    auth: &AuthContext,
    jar: CookieJar,
    org: &Organization,
    notice: Option<&str>,
    error: Option<&str>,
) -> AppResult<Response> {
    let invites = match organizations::list_invites(&state.backend, auth.token(), org.id).await {
        Ok(page) => page.results,
        Err(e) => {
            tracing::error!("Failed to load invites for organization {}: {}", org.id, e);
            Vec::new()
        }
    };

    let (jar, csrf_token) = issue_csrf(state, jar);
    let mut ctx = make_context(state, Some(&auth.user), &jar);
    ctx.insert("csrf_token", &csrf_token);
    ctx.insert("organization", org);
    ctx.insert("features", &org.plan.features.join(", "));
    ctx.insert("seats_available", &org.seats_available());
    ctx.insert("invites", &invites);
    ctx.insert("payments_enabled", &state.payments.is_some());
    ctx.insert("notice", &notice);
    ctx.insert("error", &error);

    let status = if error.is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    let html = state.templates.render("organizations/form.html", &ctx)?;
    Ok((status, jar, Html(html)).into_response())
}

pub async fn edit(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
    Query(query): Query<EditQuery>,
) -> AppResult<Response> {
    let org = organizations::get_organization(&state.backend, auth.token(), id).await?;
    let notice = match query.checkout.as_deref() {
        Some("success") => Some("Payment received. Your plan will update shortly."),
        Some("cancelled") => Some("Checkout was cancelled."),
        _ => None,
    };
    render_edit(&state, &auth, jar, &org, notice, None).await
}

#[derive(Deserialize)]
pub struct OrganizationForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    plan_name: String,
    #[serde(default)]
    features: String,
    #[serde(default)]
    seats: String,
    #[serde(default)]
    seats_used: String,
    #[serde(default)]
    csrf_token: String,
}

fn parse_seats(raw: &str, label: &str) -> Result<u32, InvalidInput> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| InvalidInput(format!("{} must be a whole number", label)))
}

impl OrganizationForm {
    fn into_update(self) -> Result<OrganizationUpdate, InvalidInput> {
        let features = self
            .features
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        Ok(OrganizationUpdate {
            name: self.name.trim().to_string(),
            plan: Plan {
                name: self.plan_name.trim().to_string(),
                features,
                seats: parse_seats(&self.seats, "Seats")?,
                seats_used: parse_seats(&self.seats_used, "Seats in use")?,
            },
        })
    }
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<OrganizationForm>,
) -> AppResult<Response> {
    if !csrf_valid(&state, &jar, &form.csrf_token) {
        return Ok((StatusCode::FORBIDDEN, "Invalid CSRF token").into_response());
    }

    let update = match form.into_update() {
        Ok(update) => update,
        Err(e) => {
            let org = organizations::get_organization(&state.backend, auth.token(), id).await?;
            return render_edit(&state, &auth, jar, &org, None, Some(&e.0)).await;
        }
    };

    match organizations::update_organization(&state.backend, auth.token(), id, &update).await {
        Ok(org) => {
            tracing::info!("Organization {} updated by user {}", org.id, auth.user.id);
            Ok(Redirect::to(&format!("/admin/organizations/{}/edit", org.id)).into_response())
        }
        Err(e) => match e.downcast_ref::<InvalidInput>() {
            Some(invalid) => {
                let message = invalid.0.clone();
                let org = organizations::get_organization(&state.backend, auth.token(), id).await?;
                render_edit(&state, &auth, jar, &org, None, Some(&message)).await
            }
            None => Err(e.into()),
        },
    }
}

#[derive(Deserialize)]
pub struct InviteForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    csrf_token: String,
}

pub async fn invite(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<InviteForm>,
) -> AppResult<Response> {
    if !csrf_valid(&state, &jar, &form.csrf_token) {
        return Ok((StatusCode::FORBIDDEN, "Invalid CSRF token").into_response());
    }

    let role = match form.role.trim() {
        "" => "member".to_string(),
        other => other.to_string(),
    };
    let new_invite = NewInvite {
        organization: id,
        email: form.email.trim().to_string(),
        role,
    };

    match organizations::create_invite(&state.backend, auth.token(), &new_invite).await {
        Ok(invite) => {
            tracing::info!("Invite {} sent for organization {}", invite.id, id);
            Ok(Redirect::to(&format!("/admin/organizations/{}/edit", id)).into_response())
        }
        Err(e) => match e.downcast_ref::<InvalidInput>() {
            Some(invalid) => {
                let message = invalid.0.clone();
                let org = organizations::get_organization(&state.backend, auth.token(), id).await?;
                render_edit(&state, &auth, jar, &org, None, Some(&message)).await
            }
            None => Err(e.into()),
        },
    }
}

use super::{checkbox, csrf_valid, issue_csrf, make_context, non_empty};
use crate::models::{DeliveryMode, Event, EventInput, MicrositeConfig, Page};
use crate::services::{assets, catalog, events, microsite, organizations, slug, InvalidInput};
use crate::web::error::{ApiResult, AppResult};
use crate::web::extractors::{CurrentUser, WantsJson};
use crate::web::handlers::gallery::render_asset_fragment;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ListQuery {
    organization: Option<i64>,
    cursor: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let organization = query.organization.or(auth.user.organization_id);
    let page = events::list_events(&state.backend, auth.token(), organization, None).await?;

    // The switcher is a nicety; the page still renders without it.
    let (orgs, orgs_error) = match organizations::all_organizations(
        &state.backend,
        auth.token(),
        state.config.backend.max_pages,
    )
    .await
    {
        Ok(orgs) => (orgs, false),
        Err(e) => {
            tracing::error!("Failed to load organizations: {}", e);
            (Vec::new(), true)
        }
    };

    let mut ctx = make_context(&state, Some(&auth.user), &jar);
    ctx.insert("events", &page.results);
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("organizations", &orgs);
    ctx.insert("organizations_error", &orgs_error);
    ctx.insert("selected_organization", &organization);

    let html = state.templates.render("events/index.html", &ctx)?;
    Ok(Html(html).into_response())
}

/// GET /events/more: the next page of the event list.
pub async fn more(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Event>>> {
    let organization = query.organization.or(auth.user.organization_id);
    let page = events::list_events(
        &state.backend,
        auth.token(),
        organization,
        query.cursor.as_deref(),
    )
    .await?;
    Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    name: String,
    is_private: Option<String>,
    #[serde(default)]
    delivery: String,
    organization_id: Option<String>,
    logo_url: Option<String>,
    background_url: Option<String>,
    primary_color: Option<String>,
    #[serde(default)]
    capture_fields: String,
    legal_text: Option<String>,
    enable_likes: Option<String>,
    #[serde(default)]
    csrf_token: String,
}

impl EventForm {
    fn into_input(self) -> Result<EventInput, InvalidInput> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(InvalidInput("Event name is required".to_string()));
        }
        let delivery: DeliveryMode = self
            .delivery
            .parse()
            .map_err(|_| InvalidInput(format!("Unknown delivery mode '{}'", self.delivery)))?;
        let organization_id = match non_empty(self.organization_id) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| InvalidInput("Invalid organization".to_string()))?,
            ),
            None => None,
        };

        Ok(EventInput {
            name,
            is_private: checkbox(&self.is_private),
            delivery,
            organization_id,
            microsite: MicrositeConfig {
                logo_url: non_empty(self.logo_url),
                background_url: non_empty(self.background_url),
                primary_color: non_empty(self.primary_color),
                capture_fields: microsite::parse_capture_fields(&self.capture_fields),
                legal_text: non_empty(self.legal_text),
                enable_likes: checkbox(&self.enable_likes),
            },
        })
    }
}

/// What the form template shows: either a saved event or a failed submission.
#[derive(Default, Serialize)]
struct FormValues {
    name: String,
    is_private: bool,
    delivery: String,
    organization_id: Option<i64>,
    microsite: MicrositeConfig,
    capture_fields: String,
}

impl From<&Event> for FormValues {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            is_private: event.is_private,
            delivery: event.delivery.to_string(),
            organization_id: event.organization_id,
            capture_fields: microsite::format_capture_fields(&event.microsite.capture_fields),
            microsite: event.microsite.clone(),
        }
    }
}

impl From<&EventInput> for FormValues {
    fn from(input: &EventInput) -> Self {
        Self {
            name: input.name.clone(),
            is_private: input.is_private,
            delivery: input.delivery.to_string(),
            organization_id: input.organization_id,
            capture_fields: microsite::format_capture_fields(&input.microsite.capture_fields),
            microsite: input.microsite.clone(),
        }
    }
}

fn render_form(
    state: &AppState,
    auth: &crate::web::extractors::AuthContext,
    jar: CookieJar,
    event_id: Option<i64>,
    values: Option<FormValues>,
    error: Option<&str>,
) -> AppResult<Response> {
    let (jar, csrf_token) = issue_csrf(state, jar);
    let mut ctx = make_context(state, Some(&auth.user), &jar);
    ctx.insert("csrf_token", &csrf_token);
    ctx.insert("event_id", &event_id);
    ctx.insert("is_new", &event_id.is_none());
    ctx.insert("values", &values.unwrap_or_default());
    ctx.insert("delivery_modes", &["none", "email", "sms", "qr"]);
    let status = match error {
        Some(error) => {
            ctx.insert("error", error);
            StatusCode::BAD_REQUEST
        }
        None => StatusCode::OK,
    };
    let html = state.templates.render("events/form.html", &ctx)?;
    Ok((status, jar, Html(html)).into_response())
}

pub async fn new_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
) -> AppResult<Response> {
    render_form(&state, &auth, jar, None, None, None)
}

pub async fn edit_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let event = events::get_event(&state.backend, auth.token(), id).await?;
    render_form(&state, &auth, jar, Some(id), Some(FormValues::from(&event)), None)
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    save_event(&state, &auth, jar, None, form).await
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    save_event(&state, &auth, jar, Some(id), form).await
}

async fn save_event(
    state: &AppState,
    auth: &crate::web::extractors::AuthContext,
    jar: CookieJar,
    id: Option<i64>,
    form: EventForm,
) -> AppResult<Response> {
    if !csrf_valid(state, &jar, &form.csrf_token) {
        return Ok((StatusCode::FORBIDDEN, "Invalid CSRF token").into_response());
    }

    let input = match form.into_input() {
        Ok(input) => input,
        Err(e) => return render_form(state, auth, jar, id, None, Some(&e.0)),
    };

    let result = match id {
        Some(id) => events::update_event(&state.backend, auth.token(), id, &input).await,
        None => events::create_event(&state.backend, auth.token(), &input).await,
    };

    match result {
        Ok(event) => {
            tracing::info!("Saved event {}", event.id);
            Ok(Redirect::to(&format!("/events/{}", event.id)).into_response())
        }
        Err(e) => {
            let message = form_error_message(&e);
            match message {
                Some(message) => render_form(
                    state,
                    auth,
                    jar,
                    id,
                    Some(FormValues::from(&input)),
                    Some(&message),
                ),
                None => Err(e.into()),
            }
        }
    }
}

/// Errors worth showing next to the form instead of on an error page.
fn form_error_message(err: &anyhow::Error) -> Option<String> {
    if let Some(invalid) = err.downcast_ref::<InvalidInput>() {
        return Some(invalid.0.clone());
    }
    match err.downcast_ref::<crate::services::backend::BackendError>() {
        Some(backend) if backend.status() == Some(StatusCode::BAD_REQUEST) => Some(backend.message()),
        _ => None,
    }
}

pub async fn show_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let event = events::get_event(&state.backend, auth.token(), id).await?;
    let page = assets::list_event_assets(&state.backend, auth.token(), id, None).await?;

    let filters = catalog::list_filters(&state.backend, auth.token(), event.organization_id, None)
        .await
        .map(|p| p.results)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to load filters: {}", e);
            Vec::new()
        });
    let custom_models =
        catalog::list_custom_models(&state.backend, auth.token(), event.organization_id, None)
            .await
            .map(|p| p.results)
            .unwrap_or_else(|e| {
                tracing::error!("Failed to load custom models: {}", e);
                Vec::new()
            });

    let mut ctx = make_context(&state, Some(&auth.user), &jar);
    ctx.insert("event", &event);
    ctx.insert("assets", &page.results);
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("filters", &filters);
    ctx.insert("custom_models", &custom_models);
    ctx.insert("secret_path", &state.hashids.secret_path(event.id));
    ctx.insert(
        "public_path",
        &format!("/e/{}/{}", event.id, slug::generate_slug(&event.name)),
    );
    ctx.insert("load_more_url", &format!("/events/{}/assets", event.id));
    ctx.insert("moderation", &true);

    let html = state.templates.render("events/detail.html", &ctx)?;
    Ok(Html(html).into_response())
}

#[derive(Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<String>,
}

/// GET /events/:id/assets: next page of an event's assets for its owner.
pub async fn event_assets(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    WantsJson(wants_json): WantsJson,
    Path(id): Path<i64>,
    Query(query): Query<CursorQuery>,
) -> ApiResult<Response> {
    let page = assets::list_event_assets(&state.backend, auth.token(), id, query.cursor.as_deref()).await?;
    if wants_json {
        return Ok(Json(page).into_response());
    }
    Ok(render_asset_fragment(&state, &page, Some(&auth.user), true)?.into_response())
}

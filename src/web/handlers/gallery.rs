use super::make_context;
use crate::models::{Asset, Event, Page, User};
use crate::services::{assets, events, microsite, slug};
use crate::web::error::{ApiError, ApiResult, AppResult};
use crate::web::extractors::{OptionalUser, WantsJson};
use crate::web::handlers::events::CursorQuery;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

/// An asset plus the bits templates cannot compute themselves.
#[derive(Serialize)]
pub struct AssetView<'a> {
    #[serde(flatten)]
    asset: &'a Asset,
    display_url: Option<&'a str>,
    like_count: usize,
    liked: bool,
}

impl<'a> AssetView<'a> {
    pub fn new(asset: &'a Asset, user: Option<&User>) -> Self {
        Self {
            asset,
            display_url: asset.display_url(),
            like_count: asset.like_count(),
            liked: user.is_some_and(|u| asset.liked_by(u.id)),
        }
    }
}

pub fn asset_views<'a>(assets: &'a [Asset], user: Option<&User>) -> Vec<AssetView<'a>> {
    assets.iter().map(|a| AssetView::new(a, user)).collect()
}

/// Renders a page of assets as the fragment appended by "load more".
pub fn render_asset_fragment(
    state: &AppState,
    page: &Page<Asset>,
    user: Option<&User>,
    moderation: bool,
) -> anyhow::Result<Html<String>> {
    let mut ctx = tera::Context::new();
    ctx.insert("assets", &asset_views(&page.results, user));
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("moderation", &moderation);
    ctx.insert("can_like", &false);
    ctx.insert("user", &user);
    Ok(Html(state.templates.render("gallery/assets.html", &ctx)?))
}

fn not_found(state: &AppState, user: Option<&User>, jar: &CookieJar) -> AppResult<Response> {
    let mut ctx = make_context(state, user, jar);
    ctx.insert("status", &404);
    ctx.insert("message", "This gallery does not exist or is not public.");
    let html = state.templates.render("error.html", &ctx)?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

/// Canonical public path for an event.
pub fn public_path(event: &Event) -> String {
    format!("/e/{}/{}", event.id, slug::generate_slug(&event.name))
}

async fn fetch_event(state: &AppState, id: i64) -> AppResult<Option<Event>> {
    match events::get_public_event(&state.backend, id).await {
        Ok(event) => Ok(Some(event)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn render_gallery(
    state: &AppState,
    user: Option<&User>,
    jar: &CookieJar,
    event: &Event,
    load_more_url: String,
) -> AppResult<Response> {
    let page = assets::list_public_assets(&state.backend, event.id, None).await?;

    let mut ctx = make_context(state, user, jar);
    ctx.insert("event", event);
    ctx.insert("assets", &asset_views(&page.results, user));
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("load_more_url", &load_more_url);
    ctx.insert("css_variables", &microsite::css_variables(&event.microsite));
    ctx.insert(
        "legal_html",
        &event
            .microsite
            .legal_text
            .as_deref()
            .map(microsite::render_legal_text),
    );
    ctx.insert("can_like", &(event.microsite.enable_likes && user.is_some()));
    ctx.insert("moderation", &false);

    let html = state.templates.render("gallery/show.html", &ctx)?;
    Ok(Html(html).into_response())
}

/// GET /e/:id: sends the visitor to the slugged URL.
pub async fn public_gallery_redirect(
    State(state): State<Arc<AppState>>,
    OptionalUser(auth): OptionalUser,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let user = auth.as_ref().map(|a| &a.user);
    match fetch_event(&state, id).await? {
        Some(event) if !event.is_private => Ok(Redirect::permanent(&public_path(&event)).into_response()),
        _ => not_found(&state, user, &jar),
    }
}

/// GET /e/:id/:slug
pub async fn public_gallery(
    State(state): State<Arc<AppState>>,
    OptionalUser(auth): OptionalUser,
    jar: CookieJar,
    Path((id, requested_slug)): Path<(i64, String)>,
) -> AppResult<Response> {
    let user = auth.as_ref().map(|a| &a.user);
    let event = match fetch_event(&state, id).await? {
        Some(event) if !event.is_private => event,
        _ => return not_found(&state, user, &jar),
    };

    if requested_slug != slug::generate_slug(&event.name) {
        return Ok(Redirect::permanent(&public_path(&event)).into_response());
    }

    let load_more_url = format!("{}/assets", public_path(&event));
    render_gallery(&state, user, &jar, &event, load_more_url).await
}

/// GET /e/:id/:slug/assets
pub async fn public_assets(
    State(state): State<Arc<AppState>>,
    OptionalUser(auth): OptionalUser,
    WantsJson(wants_json): WantsJson,
    Path((id, _slug)): Path<(i64, String)>,
    Query(query): Query<CursorQuery>,
) -> ApiResult<Response> {
    let event = events::get_public_event(&state.backend, id).await?;
    if event.is_private {
        return Err(ApiError::not_found("Gallery not found"));
    }
    assets_page(&state, auth.as_ref().map(|a| &a.user), &event, query.cursor, wants_json).await
}

/// GET /s/:hash: gallery reachable only through its unguessable link.
pub async fn secret_gallery(
    State(state): State<Arc<AppState>>,
    OptionalUser(auth): OptionalUser,
    jar: CookieJar,
    Path(hash): Path<String>,
) -> AppResult<Response> {
    let user = auth.as_ref().map(|a| &a.user);
    let Some(id) = decode_event_id(&state, &hash) else {
        return not_found(&state, user, &jar);
    };
    let Some(event) = fetch_event(&state, id).await? else {
        return not_found(&state, user, &jar);
    };

    render_gallery(&state, user, &jar, &event, format!("/s/{}/assets", hash)).await
}

/// GET /s/:hash/assets
pub async fn secret_assets(
    State(state): State<Arc<AppState>>,
    OptionalUser(auth): OptionalUser,
    WantsJson(wants_json): WantsJson,
    Path(hash): Path<String>,
    Query(query): Query<CursorQuery>,
) -> ApiResult<Response> {
    let id = decode_event_id(&state, &hash).ok_or_else(|| ApiError::not_found("Gallery not found"))?;
    let event = events::get_public_event(&state.backend, id).await?;
    assets_page(&state, auth.as_ref().map(|a| &a.user), &event, query.cursor, wants_json).await
}

fn decode_event_id(state: &AppState, hash: &str) -> Option<i64> {
    state
        .hashids
        .decode(hash)
        .and_then(|id| i64::try_from(id).ok())
}

async fn assets_page(
    state: &AppState,
    user: Option<&User>,
    event: &Event,
    cursor: Option<String>,
    wants_json: bool,
) -> ApiResult<Response> {
    let page = assets::list_public_assets(&state.backend, event.id, cursor.as_deref()).await?;
    if wants_json {
        return Ok(Json(page).into_response());
    }

    let mut ctx = tera::Context::new();
    ctx.insert("assets", &asset_views(&page.results, user));
    ctx.insert("next_cursor", &page.next_page);
    ctx.insert("moderation", &false);
    ctx.insert("can_like", &(event.microsite.enable_likes && user.is_some()));
    ctx.insert("user", &user);
    let html = state
        .templates
        .render("gallery/assets.html", &ctx)
        .map_err(anyhow::Error::from)?;
    Ok(Html(html).into_response())
}

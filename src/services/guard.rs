//! Route access rules.
//!
//! Every route group declares a [`RouteRole`]; [`decide`] maps that role and
//! the caller's [`SessionState`] to what the request should do next.

use serde::Serialize;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRole {
    /// Only for signed-out visitors (login page).
    AuthOnly,
    /// Anyone; the user is loaded when there is a session.
    Optional,
    /// Signed-in users.
    Protected,
    /// Signed-in pro users.
    Admin,
}

impl RouteRole {
    pub const ALL: [RouteRole; 4] = [
        RouteRole::AuthOnly,
        RouteRole::Optional,
        RouteRole::Protected,
        RouteRole::Admin,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub logged_in: bool,
    pub pro: bool,
    /// The session's user profile has been loaded.
    pub hydrated: bool,
}

impl SessionState {
    pub const ANONYMOUS: SessionState = SessionState {
        logged_in: false,
        pro: false,
        hydrated: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    Redirect(&'static str),
    /// Load the user profile and decide again.
    Hydrate,
}

pub fn decide(role: RouteRole, state: SessionState) -> GuardDecision {
    use GuardDecision::*;

    match role {
        RouteRole::AuthOnly if state.logged_in => Redirect(HOME_PATH),
        RouteRole::AuthOnly => Render,
        _ if state.logged_in && !state.hydrated => Hydrate,
        RouteRole::Optional => Render,
        RouteRole::Protected if state.logged_in => Render,
        RouteRole::Protected => Redirect(LOGIN_PATH),
        RouteRole::Admin if !state.logged_in => Redirect(LOGIN_PATH),
        RouteRole::Admin if state.pro => Render,
        RouteRole::Admin => Redirect(HOME_PATH),
    }
}

/// Builds the login redirect target, remembering where the user was going.
pub fn login_redirect(next: &str) -> String {
    if next.is_empty() || next == "/" || !next.starts_with('/') || next.starts_with("//") {
        return LOGIN_PATH.to_string();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{}?next={}", LOGIN_PATH, encoded)
}

/// Accepts only same-site relative paths as a post-login destination.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => HOME_PATH,
    }
}

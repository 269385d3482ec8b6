use crate::models::{LoginResponse, Session, User};
use crate::services::backend::{BackendClient, BackendResult};
use crate::Database;
use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use rusqlite::OptionalExtension;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub const SESSION_COOKIE: &str = "session";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Exchanges credentials for a backend bearer token.
pub async fn login(backend: &BackendClient, email: &str, password: &str) -> BackendResult<LoginResponse> {
    backend
        .post("auth/login/", &Credentials { email, password }, None)
        .await
}

pub async fn fetch_profile(backend: &BackendClient, access_token: &str) -> BackendResult<User> {
    backend.get("users/me/", Some(access_token)).await
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Only a digest of the cookie value is stored.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn expires_modifier(lifetime: Duration) -> String {
    format!("+{} seconds", lifetime.as_secs())
}

/// Stores a session for `access_token` and returns the cookie value.
pub fn create_session(
    db: &Database,
    access_token: &str,
    user: Option<&User>,
    lifetime: Duration,
) -> Result<String> {
    let token = generate_session_token();
    let user_json = user.map(serde_json::to_string).transpose()?;
    let conn = db.get()?;
    conn.execute(
        "INSERT INTO sessions (token_hash, access_token, user_json, expires_at) VALUES (?, ?, ?, datetime('now', ?))",
        (
            hash_token(&token),
            access_token,
            user_json,
            expires_modifier(lifetime),
        ),
    )?;
    Ok(token)
}

pub fn get_session(db: &Database, token: &str) -> Result<Option<Session>> {
    let conn = db.get()?;
    let row = conn
        .query_row(
            "SELECT id, access_token, user_json, expires_at FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
            [hash_token(token)],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, access_token, user_json, expires_at)) = row else {
        return Ok(None);
    };

    // A profile that no longer parses is treated as not hydrated.
    let user = user_json.and_then(|json| serde_json::from_str::<User>(&json).ok());

    Ok(Some(Session {
        id,
        access_token,
        user,
        expires_at,
    }))
}

/// Caches the user profile on a session.
pub fn hydrate_session(db: &Database, session_id: i64, user: &User) -> Result<()> {
    let conn = db.get()?;
    conn.execute(
        "UPDATE sessions SET user_json = ? WHERE id = ?",
        (serde_json::to_string(user)?, session_id),
    )?;
    Ok(())
}

pub fn delete_session(db: &Database, token: &str) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sessions WHERE token_hash = ?", [hash_token(token)])?;
    Ok(())
}

pub fn delete_session_by_id(db: &Database, session_id: i64) -> Result<()> {
    let conn = db.get()?;
    conn.execute("DELETE FROM sessions WHERE id = ?", [session_id])?;
    Ok(())
}

pub fn cleanup_expired_sessions(db: &Database) -> Result<usize> {
    let conn = db.get()?;
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;
    Ok(removed)
}

pub fn count_sessions(db: &Database) -> Result<i64> {
    let conn = db.get()?;
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE expires_at > datetime('now')",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

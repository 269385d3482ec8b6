use crate::services::backend::BackendError;
use crate::services::InvalidInput;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Redirect, Response};

/// Response extension set when the backend refused the caller's token.
///
/// [`crate::web::extractors::enforce`] drops the local session when it sees it.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected;

/// Error type for HTML handlers.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(backend) = self.0.downcast_ref::<BackendError>() {
            if backend.is_unauthorized() {
                tracing::warn!("Backend rejected the session token, sending user to login: {}", backend);
                let mut response = Redirect::to("/login").into_response();
                response.extensions_mut().insert(TokenRejected);
                return response;
            }
            if backend.is_not_found() {
                tracing::warn!("Backend resource not found: {}", backend);
                return (StatusCode::NOT_FOUND, Html(error_page("Not found"))).into_response();
            }
            if let BackendError::ForeignCursor(cursor) = backend {
                tracing::warn!("Refusing foreign page cursor {}", cursor);
                return (StatusCode::BAD_REQUEST, Html(error_page("Invalid page cursor"))).into_response();
            }
        }
        if let Some(invalid) = self.0.downcast_ref::<InvalidInput>() {
            tracing::warn!("Rejected input: {}", invalid);
            return (StatusCode::BAD_REQUEST, Html(error_page(&invalid.0))).into_response();
        }

        tracing::error!("Application error: {:?}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(error_page("Something went wrong. Please try again.")),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;

fn error_page(message: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Error</title></head><body><main class=\"error\"><p>{}</p><a href=\"/\">Back</a></main></body></html>",
        ammonia::clean_text(message)
    )
}

/// Error type for JSON endpoints.
///
/// Upstream failures keep their message; everything but auth, not-found and
/// input errors is reported as a 500.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    token_rejected: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            token_rejected: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(backend) = err.downcast_ref::<BackendError>() {
            return Self::from_backend(backend);
        }
        if let Some(invalid) = err.downcast_ref::<InvalidInput>() {
            tracing::warn!("Rejected input: {}", invalid);
            return Self::bad_request(invalid.0.clone());
        }
        tracing::error!("API error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        Self::from_backend(&err)
    }
}

impl ApiError {
    fn from_backend(err: &BackendError) -> Self {
        if err.is_unauthorized() {
            tracing::warn!("Backend rejected the session token: {}", err);
            return Self {
                token_rejected: true,
                ..Self::unauthorized()
            };
        }
        if err.is_not_found() {
            tracing::warn!("Backend resource not found: {}", err);
            return Self::not_found(err.message());
        }
        if let BackendError::ForeignCursor(cursor) = err {
            tracing::warn!("Refusing foreign page cursor {}", cursor);
            return Self::bad_request("Invalid page cursor");
        }
        tracing::error!("Upstream error: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        let mut response = (self.status, Json(body)).into_response();
        if self.token_rejected {
            response.extensions_mut().insert(TokenRejected);
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

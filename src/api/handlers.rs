use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::auth::{AuthKeys, AuthUser};
use crate::audit::AuditHub;
use crate::models::{AuditAction, AuditEvent, BatchEntry};
use crate::service::LinkService;
use crate::storage::StorageError;

pub struct AppState {
    pub service: Arc<LinkService>,
    pub audit: Arc<AuditHub>,
    pub keys: Arc<AuthKeys>,
    /// Prefix for returned short URLs, ends with `/`
    pub base_url: String,
}

impl AppState {
    fn short_url(&self, short_code: &str) -> String {
        format!("{}{}", self.base_url, short_code)
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct ShortenRequest {
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct ShortenResponse {
    pub result: String,
}

#[derive(Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Accepts absolute http(s) URLs, or host-only strings that become one with `http://`
pub fn is_valid_url(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.is_empty() {
        return false;
    }

    let parsed = match url::Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match url::Url::parse(&format!("http://{}", raw)) {
                Ok(parsed) => parsed,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some_and(|h| !h.is_empty())
}

async fn shorten(
    state: &AppState,
    user: &AuthUser,
    original_url: &str,
) -> Result<(StatusCode, String), Response> {
    let created = state
        .service
        .create(original_url, &user.id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    state
        .audit
        .notify(&AuditEvent::now(AuditAction::Shorten, &user.id, original_url))
        .await;

    let status = if created.conflict {
        StatusCode::CONFLICT
    } else {
        StatusCode::CREATED
    };

    Ok((status, state.short_url(&created.short_code)))
}

/// Shorten a URL sent as a plain-text body
pub async fn create_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: String,
) -> Response {
    let original_url = body.trim();
    if !is_valid_url(original_url) {
        return error(StatusCode::BAD_REQUEST, "invalid url");
    }

    match shorten(&state, &user, original_url).await {
        Ok((status, short_url)) => (status, short_url).into_response(),
        Err(response) => response,
    }
}

/// Shorten a URL sent as `{"url": ...}`
pub async fn create_json(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Response {
    let payload: ShortenRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return error(StatusCode::BAD_REQUEST, "Invalid JSON format"),
    };

    let original_url = payload.url.trim();
    if !is_valid_url(original_url) {
        return error(StatusCode::BAD_REQUEST, "invalid url");
    }

    match shorten(&state, &user, original_url).await {
        Ok((status, result)) => (status, Json(ShortenResponse { result })).into_response(),
        Err(response) => response,
    }
}

/// Shorten a list of `{"correlation_id", "original_url"}` entries
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Response {
    let mut entries: Vec<BatchEntry> = match serde_json::from_slice(&body) {
        Ok(entries) => entries,
        Err(_) => return error(StatusCode::BAD_REQUEST, "failed to read request body"),
    };

    if entries.is_empty() {
        return error(StatusCode::BAD_REQUEST, "batch payload is empty");
    }

    for entry in &mut entries {
        entry.original_url = entry.original_url.trim().to_string();
        if !is_valid_url(&entry.original_url) {
            return error(
                StatusCode::BAD_REQUEST,
                format!("invalid url for correlation_id {}", entry.correlation_id),
            );
        }
    }

    // The batch clears original_url in place, so keep the URLs for auditing
    let originals: Vec<String> = entries.iter().map(|e| e.original_url.clone()).collect();

    if let Err(e) = state.service.batch_create(&mut entries, &user.id).await {
        return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    for original_url in &originals {
        state
            .audit
            .notify(&AuditEvent::now(AuditAction::Shorten, &user.id, original_url))
            .await;
    }

    for entry in &mut entries {
        entry.short_url = state.short_url(&entry.short_url);
    }

    (StatusCode::CREATED, Json(entries)).into_response()
}

/// Redirect to the original URL
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(code): Path<String>,
) -> Response {
    match state.service.resolve(&code).await {
        Ok((_, true)) => StatusCode::GONE.into_response(),
        Ok((original_url, false)) => {
            state
                .audit
                .notify(&AuditEvent::now(AuditAction::Follow, &user.id, &original_url))
                .await;

            (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, original_url)]).into_response()
        }
        Err(StorageError::NotFound) => StatusCode::BAD_REQUEST.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Relational backend liveness
pub async fn ping(State(state): State<Arc<AppState>>) -> Response {
    match state.service.liveness_check().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// List every URL the caller has shortened
pub async fn user_urls(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    if user.is_new {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let links = match state.service.list_owned(&user.id).await {
        Ok(links) => links,
        Err(e) => return error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    if links.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let urls: Vec<UserUrl> = links
        .into_iter()
        .map(|link| UserUrl {
            short_url: state.short_url(&link.short_url),
            original_url: link.original_url,
        })
        .collect();

    Json(urls).into_response()
}

/// Soft-delete the caller's codes in the background
pub async fn delete_user_urls(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Bytes,
) -> Response {
    if user.is_new {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let codes: Vec<String> = match serde_json::from_slice(&body) {
        Ok(codes) => codes,
        Err(_) => return error(StatusCode::BAD_REQUEST, "expected a JSON array of short codes"),
    };

    let service = Arc::clone(&state.service);
    tokio::spawn(async move {
        // Failures are already logged by the service
        let _ = service.soft_delete(&codes, &user.id).await;
    });

    StatusCode::ACCEPTED.into_response()
}

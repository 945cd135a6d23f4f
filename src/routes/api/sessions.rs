use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{
        Principal, SessionView,
        device::{REFRESH_COOKIE_NAME, get_cookie},
    },
    error::AppError,
    response::{ApiResult, JsonApiResponse},
    state::AppState,
};

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionView>,
    pub total: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/sessions", get(list_sessions))
        .route("/auth/sessions/{id}", delete(revoke_session))
        .with_state(state)
}

fn current_refresh_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| get_cookie(headers, REFRESH_COOKIE_NAME))
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    headers: HeaderMap,
) -> ApiResult<SessionList> {
    let sessions = state
        .sessions
        .list_sessions(principal.user_id, current_refresh_token(&headers))
        .await?;
    JsonApiResponse::ok(SessionList {
        total: sessions.len(),
        sessions,
    })
}

async fn revoke_session(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.revoke_session(principal.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{Principal, TokenBundle, device::ClientDevice},
    error::AppError,
    response::{ApiResult, JsonApiResponse},
    services::user_service::{RegisterInput, UserView},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: i64,
}

impl From<TokenBundle> for TokenResponse {
    fn from(bundle: TokenBundle) -> Self {
        Self {
            access_token: bundle.access_token,
            refresh_token: bundle.refresh_token,
            token_type: bundle.token_type,
            expires_in: bundle.expires_in,
            expires_at: bundle.expires_at,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/me", get(me))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<UserView> {
    let user = state
        .services
        .user()
        .register(RegisterInput {
            email: body.email,
            password: body.password,
            full_name: body.full_name,
            role: body.role,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", user)
}

async fn login(
    State(state): State<Arc<AppState>>,
    ClientDevice(device): ClientDevice,
    Json(body): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let tokens = state.sessions.login(&body.email, &body.password, device).await?;
    JsonApiResponse::ok(tokens.into())
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<TokenResponse> {
    let tokens = state.sessions.refresh(&body.refresh_token).await?;
    JsonApiResponse::ok(tokens.into())
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<StatusCode, AppError> {
    state.sessions.logout(&body.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout_all(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<StatusCode, AppError> {
    state.sessions.logout_everywhere(principal.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<Arc<AppState>>, principal: Principal) -> ApiResult<UserView> {
    let user = state.services.user().view(&principal.user_id).await?;
    JsonApiResponse::ok(user)
}

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use uuid::Uuid;

use crate::{auth::AdminRole, error::AppError, middleware::AuthRoleGuard, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/users/{id}/logout-all", post(force_logout))
        .with_state(state)
}

async fn force_logout(
    State(state): State<Arc<AppState>>,
    AuthRoleGuard { principal, .. }: AuthRoleGuard<AdminRole>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let revoked = state.sessions.logout_everywhere(user_id).await?;
    tracing::warn!(
        admin_id = %principal.user_id,
        target_user_id = %user_id,
        revoked,
        "admin revoked all sessions of user"
    );
    Ok(StatusCode::NO_CONTENT)
}

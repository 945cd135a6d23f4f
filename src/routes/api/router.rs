use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{admin, auth, sessions};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(sessions::router(state.clone()))
        .merge(admin::router(state))
}

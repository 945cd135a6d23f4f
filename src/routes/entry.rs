use std::{sync::Arc, time::Duration};

use axum::{Router, http::StatusCode, middleware};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    middleware::{catch_panic_layer, json_error_middleware},
    state::AppState,
};

use super::{api, health};

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest(API_PREFIX, api::router(state))
        .merge(health::router())
}

/// The router with the full middleware stack, as served.
pub fn app(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.general.request_timeout_secs);

    router(state)
        .layer(middleware::from_fn(json_error_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http())
}

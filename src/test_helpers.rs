//! Fixtures shared by unit and integration tests.

use std::{sync::Arc, time::Duration};

use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::{
    auth::{AuthError, PasswordHasher, bootstrap::build_auth},
    config::{AppConfig, AuthConfig},
    db::connection::sync_schema,
    routes::app,
    services::ServiceContext,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Reversible stand-in for argon2 so tests stay fast. Never use outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        Ok(format!("plain:{plaintext}"))
    }

    fn verify(&self, hash: &str, plaintext: &str) -> bool {
        hash.strip_prefix("plain:") == Some(plaintext)
    }
}

/// Fresh in-memory SQLite database with the schema synced from entities.
/// One pooled connection, since every SQLite memory connection is its own database.
pub async fn memory_db() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    sync_schema(&db).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        auth: Some(AuthConfig::with_secret(TEST_JWT_SECRET)),
        ..AppConfig::default()
    }
}

pub fn build_state(cfg: AppConfig, db: DatabaseConnection) -> anyhow::Result<Arc<AppState>> {
    let auth_cfg = cfg
        .auth
        .clone()
        .unwrap_or_else(|| AuthConfig::with_secret(TEST_JWT_SECRET));
    let services = ServiceContext::new(&db, Arc::new(PlainTextHasher));
    let auth = build_auth(&auth_cfg, services.daos(), services.hasher())?;
    Ok(AppState::new(cfg, db, services, auth))
}

pub async fn test_state() -> anyhow::Result<Arc<AppState>> {
    build_state(test_config(), memory_db().await?)
}

pub async fn test_app() -> anyhow::Result<(Router, Arc<AppState>)> {
    let state = test_state().await?;
    Ok((app(Arc::clone(&state)), state))
}

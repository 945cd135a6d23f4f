use std::sync::Arc;

use chrono::Duration;

use super::{AuthError, AuthGateway, PasswordHasher, SessionManager, TokenSigner};
use crate::{config::AuthConfig, db::dao::DaoContext};

pub struct AuthComponents {
    pub sessions: SessionManager,
    pub gateway: AuthGateway,
}

pub fn build_auth(
    cfg: &AuthConfig,
    daos: &DaoContext,
    hasher: Arc<dyn PasswordHasher>,
) -> Result<AuthComponents, AuthError> {
    let signer = TokenSigner::new(cfg.jwt_secret.as_bytes(), cfg.issuer.clone());
    let sessions = SessionManager::new(daos, signer, hasher, Duration::days(cfg.refresh_ttl_days))?;
    let gateway = AuthGateway::new(sessions.clone());
    Ok(AuthComponents { sessions, gateway })
}

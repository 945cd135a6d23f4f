use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    AuthError, Claims, PasswordHasher, TokenBundle, TokenSigner,
    jwt::{ACCESS_TOKEN_TTL_SECS, MintedToken},
};
use crate::{
    db::dao::{DaoBase, DaoContext, DaoLayerError, DeviceMeta, SessionDao, UserDao},
    db::entities::{session, user},
    services::user_service::normalize_email,
};

const TIMING_DUMMY_PASSWORD: &str = "timing-equalization-dummy-password";

/// A live session as shown to its owner.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub id: Uuid,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub last_used_at: DateTime<FixedOffset>,
    pub expires_at: DateTime<FixedOffset>,
    pub is_current: bool,
}

/// Login, refresh rotation with reuse detection, and session revocation.
///
/// Holds no locks of its own: concurrent refreshes of one token are settled
/// by the conditional revoke inside [`SessionDao::rotate`].
#[derive(Clone)]
pub struct SessionManager {
    users: UserDao,
    sessions: SessionDao,
    signer: TokenSigner,
    hasher: Arc<dyn PasswordHasher>,
    refresh_ttl: Duration,
    dummy_hash: Arc<str>,
}

impl SessionManager {
    pub fn new(
        daos: &DaoContext,
        signer: TokenSigner,
        hasher: Arc<dyn PasswordHasher>,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash(TIMING_DUMMY_PASSWORD)?;
        Ok(Self {
            users: daos.user(),
            sessions: daos.session(),
            signer,
            hasher,
            refresh_ttl,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: DeviceMeta,
    ) -> Result<TokenBundle, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Burn the same verification cost as a real account would.
            self.verify_password(&self.dummy_hash, password).await?;
            warn!(reason = "unknown_email", "login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(&user.password_hash, password).await? {
            warn!(user_id = %user.id, reason = "bad_password", "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            warn!(user_id = %user.id, reason = "inactive", "login failed");
            return Err(AuthError::AccountInactive);
        }

        let access = self.signer.mint(&user)?;
        let expires_at = Utc::now().fixed_offset() + self.refresh_ttl;
        let session = self.sessions.create_root(user.id, device, expires_at).await?;

        info!(
            user_id = %user.id,
            session_id = %session.id,
            token_family = %session.token_family,
            "login succeeded"
        );
        Ok(bundle(access, session.refresh_token))
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle, AuthError> {
        let Some(session) = self.sessions.find_by_token(refresh_token).await? else {
            warn!(reason = "unknown_token", "refresh failed");
            return Err(AuthError::InvalidRefreshToken);
        };

        if session.is_revoked {
            return Err(self.contain_reuse(&session).await);
        }

        let now = Utc::now().fixed_offset();
        if session.is_expired_at(now) {
            warn!(session_id = %session.id, reason = "expired", "refresh failed");
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self.owner_of(&session).await?;
        if !user.is_active {
            warn!(
                user_id = %user.id,
                session_id = %session.id,
                reason = "inactive",
                "refresh failed"
            );
            return Err(AuthError::AccountInactive);
        }

        let access = self.signer.mint(&user)?;
        let child = match self.sessions.rotate(&session, now + self.refresh_ttl).await {
            Ok(child) => child,
            // Another request rotated this token first; treat it as replay.
            Err(DaoLayerError::AlreadyRevoked { .. }) => {
                return Err(self.contain_reuse(&session).await);
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            user_id = %user.id,
            session_id = %child.id,
            parent_id = %session.id,
            token_family = %child.token_family,
            "refresh token rotated"
        );
        Ok(bundle(access, child.refresh_token))
    }

    /// Revokes the session behind `refresh_token`. Unknown or already revoked
    /// tokens are a no-op.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let revoked = self.sessions.revoke_by_token(refresh_token).await?;
        if revoked > 0 {
            info!("session logged out");
        }
        Ok(())
    }

    pub async fn logout_everywhere(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let revoked = self.sessions.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "all sessions revoked");
        Ok(revoked)
    }

    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        current_token: Option<&str>,
    ) -> Result<Vec<SessionView>, AuthError> {
        let now = Utc::now().fixed_offset();
        let sessions = self.sessions.list_active_for_user(user_id, now).await?;
        Ok(sessions
            .into_iter()
            .map(|session| {
                let is_current = current_token == Some(session.refresh_token.as_str());
                SessionView {
                    id: session.id,
                    device_name: session.device_name,
                    ip_address: session.ip_address,
                    created_at: session.created_at,
                    last_used_at: session.last_used_at,
                    expires_at: session.expires_at,
                    is_current,
                }
            })
            .collect())
    }

    /// Revokes one of the caller's own sessions. Someone else's session id is
    /// reported as missing.
    pub async fn revoke_session(&self, user_id: Uuid, session_id: Uuid) -> Result<(), AuthError> {
        let session = self.sessions.find_by_id(session_id).await?;
        if session.user_id != user_id {
            warn!(
                user_id = %user_id,
                session_id = %session_id,
                "attempt to revoke foreign session"
            );
            return Err(AuthError::NotFound);
        }

        self.sessions.revoke(session_id).await?;
        info!(user_id = %user_id, session_id = %session_id, "session revoked");
        Ok(())
    }

    /// Purely cryptographic: a revoked session does not invalidate access
    /// tokens minted before the revocation.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token)
    }

    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let purged = self.sessions.purge_expired(Utc::now().fixed_offset()).await?;
        Ok(purged)
    }

    async fn contain_reuse(&self, session: &session::Model) -> AuthError {
        match self.sessions.revoke_family(session.token_family).await {
            Ok(revoked) => error!(
                user_id = %session.user_id,
                session_id = %session.id,
                token_family = %session.token_family,
                revoked,
                "refresh token reuse detected, token family revoked"
            ),
            Err(err) => error!(
                user_id = %session.user_id,
                session_id = %session.id,
                token_family = %session.token_family,
                error = %err,
                "refresh token reuse detected, family revocation failed"
            ),
        }
        AuthError::TokenReused
    }

    async fn owner_of(&self, session: &session::Model) -> Result<user::Model, AuthError> {
        match self.users.find_by_id(session.user_id).await {
            Ok(user) => Ok(user),
            Err(DaoLayerError::NotFound { .. }) => Err(AuthError::InvalidRefreshToken),
            Err(err) => Err(err.into()),
        }
    }

    async fn verify_password(&self, hash: &str, password: &str) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let hash = hash.to_owned();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&hash, &password))
            .await
            .map_err(|err| AuthError::Internal(format!("password verification failed: {err}")))
    }
}

fn bundle(access: MintedToken, refresh_token: String) -> TokenBundle {
    TokenBundle {
        access_token: access.token,
        refresh_token,
        token_type: "Bearer",
        expires_in: ACCESS_TOKEN_TTL_SECS,
        expires_at: access.claims.exp,
    }
}

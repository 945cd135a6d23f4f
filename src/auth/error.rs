use thiserror::Error;

use crate::{db::dao::DaoLayerError, error::AppError};

/// Failure kinds of the session subsystem. Several collapse to the same
/// client-facing message; the variant itself is kept for logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is inactive")]
    AccountInactive,
    #[error("email already registered")]
    EmailAlreadyRegistered,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("refresh token reused")]
    TokenReused,
    #[error("invalid access token")]
    InvalidAccessToken,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DaoLayerError> for AuthError {
    fn from(err: DaoLayerError) -> Self {
        match err {
            DaoLayerError::NotFound { .. } => AuthError::NotFound,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                AppError::unauthorized("Invalid credentials")
            }
            AuthError::EmailAlreadyRegistered => AppError::conflict("Email already registered"),
            AuthError::InvalidRefreshToken => AppError::unauthorized("Invalid refresh token"),
            AuthError::RefreshTokenExpired => AppError::unauthorized("Refresh token expired"),
            AuthError::TokenReused => AppError::unauthorized("Refresh token has been revoked"),
            AuthError::InvalidAccessToken | AuthError::Unauthorized => {
                AppError::unauthorized("Unauthorized")
            }
            AuthError::Forbidden => AppError::forbidden("Insufficient permissions"),
            AuthError::NotFound => AppError::not_found("Not found"),
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "auth internal error");
                AppError::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::AuthError;
    use crate::error::AppError;

    fn external(err: AuthError) -> (StatusCode, String) {
        let app = AppError::from(err);
        (app.status(), app.message().to_string())
    }

    #[test]
    fn inactive_account_is_indistinguishable_from_bad_credentials() {
        assert_eq!(
            external(AuthError::AccountInactive),
            external(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn reuse_surfaces_as_generic_revocation() {
        assert_eq!(
            external(AuthError::TokenReused),
            (
                StatusCode::UNAUTHORIZED,
                "Refresh token has been revoked".to_string()
            )
        );
    }

    #[test]
    fn access_token_failures_never_say_why() {
        assert_eq!(
            external(AuthError::InvalidAccessToken),
            external(AuthError::Unauthorized)
        );
    }

    #[test]
    fn forbidden_is_distinct_from_unauthorized() {
        assert_eq!(external(AuthError::Forbidden).0, StatusCode::FORBIDDEN);
        assert_eq!(
            external(AuthError::EmailAlreadyRegistered).0,
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_detail_stays_out_of_the_response() {
        let (status, message) = external(AuthError::Internal("db down".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }
}

use axum::http::{HeaderMap, header};

use super::{
    AuthError, Principal, Role, SessionManager,
    device::{ACCESS_COOKIE_NAME, get_cookie},
};

/// Per-request gate: who is calling, and may they do this.
#[derive(Clone)]
pub struct AuthGateway {
    sessions: SessionManager,
}

impl AuthGateway {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Any failure, whatever its cause, is reported as `Unauthorized`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Unauthorized)?;
        self.sessions
            .validate_access_token(token)
            .map(Principal::from)
            .map_err(|_| AuthError::Unauthorized)
    }

    pub fn authorize(principal: &Principal, allowed: &[Role]) -> bool {
        allowed.contains(&principal.role)
    }

    pub fn require(principal: &Principal, allowed: &[Role]) -> Result<(), AuthError> {
        if Self::authorize(principal, allowed) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// The `Authorization: Bearer` header wins; the access cookie is the fallback.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty());

    from_header.or_else(|| get_cookie(headers, ACCESS_COOKIE_NAME).filter(|t| !t.is_empty()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderMap, HeaderValue, header};
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{AuthGateway, bearer_token};
    use crate::{
        auth::{AuthError, Claims, Principal, Role, SessionManager, TokenSigner},
        db::dao::DaoContext,
        test_helpers::PlainTextHasher,
    };

    fn gateway() -> (AuthGateway, TokenSigner) {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let signer = TokenSigner::new(b"gateway-secret", "wms-lite");
        let manager = SessionManager::new(
            &DaoContext::new(&db),
            signer.clone(),
            Arc::new(PlainTextHasher),
            Duration::days(7),
        )
        .expect("manager should build");
        (AuthGateway::new(manager), signer)
    }

    fn token(signer: &TokenSigner, role: Role) -> String {
        let now = Utc::now().timestamp();
        signer
            .encode(&Claims {
                sub: Uuid::new_v4(),
                email: "alice@example.com".to_string(),
                role,
                iat: now,
                exp: now + 300,
                iss: "wms-lite".to_string(),
            })
            .expect("token should encode")
    }

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).expect("valid header"));
        headers
    }

    #[test]
    fn prefers_authorization_header_over_cookie() {
        let mut map = headers(header::AUTHORIZATION, "Bearer from-header");
        map.insert(
            header::COOKIE,
            HeaderValue::from_static("access_token=from-cookie"),
        );

        assert_eq!(bearer_token(&map), Some("from-header"));
    }

    #[test]
    fn falls_back_to_cookie() {
        let map = headers(header::COOKIE, "access_token=from-cookie");
        assert_eq!(bearer_token(&map), Some("from-cookie"));

        let basic = headers(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&basic), None);
    }

    #[test]
    fn authenticates_valid_bearer() {
        let (gateway, signer) = gateway();
        let map = headers(
            header::AUTHORIZATION,
            &format!("Bearer {}", token(&signer, Role::Readonly)),
        );

        let principal = gateway.authenticate(&map).expect("token should pass");
        assert_eq!(principal.role, Role::Readonly);
    }

    #[test]
    fn every_failure_is_plain_unauthorized() {
        let (gateway, _) = gateway();
        let foreign = TokenSigner::new(b"other-secret", "wms-lite");

        for map in [
            HeaderMap::new(),
            headers(header::AUTHORIZATION, "Bearer garbage"),
            headers(
                header::AUTHORIZATION,
                &format!("Bearer {}", token(&foreign, Role::Admin)),
            ),
        ] {
            assert!(matches!(
                gateway.authenticate(&map),
                Err(AuthError::Unauthorized)
            ));
        }
    }

    #[test]
    fn role_check_is_set_membership() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            role: Role::User,
        };

        assert!(AuthGateway::authorize(&principal, &[Role::User, Role::Admin]));
        assert!(!AuthGateway::authorize(&principal, &[Role::Admin]));
        assert!(matches!(
            AuthGateway::require(&principal, &[Role::Admin]),
            Err(AuthError::Forbidden)
        ));
    }
}

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{AuthError, Claims, Role};
use crate::db::entities::user;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub claims: Claims,
}

/// Mints and checks access tokens. Verification never touches the database.
#[derive(Clone)]
pub struct TokenSigner {
    enc: EncodingKey,
    dec: DecodingKey,
    issuer: String,
    validation: Validation,
}

impl TokenSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        // Only HS256 is accepted; tokens declaring any other algorithm fail.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
            issuer,
            validation,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn mint(&self, user: &user::Model) -> Result<MintedToken, AuthError> {
        let role = Role::try_from(user.role.as_str())
            .map_err(|_| AuthError::Internal(format!("unknown role '{}'", user.role)))?;
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role,
            iat,
            exp: iat + ACCESS_TOKEN_TTL_SECS,
            iss: self.issuer.clone(),
        };
        let token = self.encode(&claims)?;
        Ok(MintedToken { token, claims })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, claims, &self.enc)
            .map_err(|err| AuthError::Internal(format!("token encoding failed: {err}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.dec, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "access token rejected");
                AuthError::InvalidAccessToken
            })
    }
}

#[cfg(test)]
mod tests {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::{FixedOffset, TimeZone, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use uuid::Uuid;

    use super::{ACCESS_TOKEN_TTL_SECS, TokenSigner};
    use crate::{
        auth::{AuthError, Claims, Role},
        db::entities::user,
    };

    const SECRET: &[u8] = b"unit-test-secret";

    fn user_model(role: &str) -> user::Model {
        let ts = FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid");
        user::Model {
            id: Uuid::new_v4(),
            created_at: ts,
            updated_at: ts,
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Alice".to_string(),
            role: role.to_string(),
            is_active: true,
        }
    }

    fn claims(exp_offset: i64, iss: &str) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            role: Role::User,
            iat: now,
            exp: now + exp_offset,
            iss: iss.to_string(),
        }
    }

    #[test]
    fn mints_fifteen_minute_token_with_user_claims() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let user = user_model("admin");

        let minted = signer.mint(&user).expect("token should mint");

        assert_eq!(minted.claims.sub, user.id);
        assert_eq!(minted.claims.email, user.email);
        assert_eq!(minted.claims.role, Role::Admin);
        assert_eq!(minted.claims.iss, "wms-lite");
        assert_eq!(minted.claims.exp - minted.claims.iat, ACCESS_TOKEN_TTL_SECS);

        let verified = signer.verify(&minted.token).expect("token should verify");
        assert_eq!(verified, minted.claims);
    }

    #[test]
    fn refuses_to_mint_for_unknown_role() {
        let signer = TokenSigner::new(SECRET, "wms-lite");

        let err = signer
            .mint(&user_model("superuser"))
            .expect_err("unknown role should fail");
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let other = TokenSigner::new(b"another-secret", "wms-lite");
        let token = other
            .encode(&claims(300, "wms-lite"))
            .expect("token should encode");

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn rejects_expired_token_beyond_leeway() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let token = signer
            .encode(&claims(-120, "wms-lite"))
            .expect("token should encode");

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn rejects_foreign_issuer() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let token = signer
            .encode(&claims(300, "someone-else"))
            .expect("token should encode");

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn rejects_other_hmac_algorithm_with_same_secret() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims(300, "wms-lite"),
            &EncodingKey::from_secret(SECRET),
        )
        .expect("token should encode");

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }

    #[test]
    fn rejects_unsigned_token() {
        let signer = TokenSigner::new(SECRET, "wms-lite");
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims(300, "wms-lite")).expect("claims should serialize"),
        );
        let token = format!("{header}.{payload}.");

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidAccessToken)
        ));
    }
}

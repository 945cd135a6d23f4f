use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Readonly,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Readonly => "readonly",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "readonly" => Ok(Role::Readonly),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker for handlers gated on a fixed role set.
pub trait RequiredRole {
    fn allowed() -> &'static [Role];
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

/// Access-token claim set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{AdminRole, RequiredRole, Role};

    #[test]
    fn role_string_roundtrip() {
        for role in [Role::User, Role::Admin, Role::Readonly] {
            assert_eq!(Role::try_from(role.as_str()), Ok(role));
        }
        assert!(Role::try_from("manager").is_err());
        assert!(Role::try_from("Admin").is_err());
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Role::Readonly).expect("role should serialize");
        assert_eq!(json, "\"readonly\"");
    }

    #[test]
    fn admin_marker_allows_only_admin() {
        assert_eq!(AdminRole::allowed(), &[Role::Admin]);
    }
}

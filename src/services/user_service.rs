use std::sync::Arc;

use sea_orm::SqlErr;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{AuthError, PasswordHasher, Role},
    db::dao::{DaoBase, DaoLayerError, UserDao},
    db::entities::user,
    error::AppError,
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 72;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

impl TryFrom<user::Model> for UserView {
    type Error = AuthError;

    fn try_from(model: user::Model) -> Result<Self, Self::Error> {
        let role = Role::try_from(model.role.as_str())
            .map_err(|_| AuthError::Internal(format!("user {} has unknown role", model.id)))?;
        Ok(Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            role,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(user_dao: UserDao, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { user_dao, hasher }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<UserView, AppError> {
        let email = normalize_email(&input.email);
        if !is_plausible_email(&email) {
            return Err(AppError::bad_request("Invalid email address"));
        }

        let password_len = input.password.len();
        if password_len < MIN_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if password_len > MAX_PASSWORD_LEN {
            return Err(AppError::bad_request(format!(
                "Password must be at most {MAX_PASSWORD_LEN} characters"
            )));
        }

        let full_name = input.full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::bad_request("Full name required"));
        }

        let role = match input.role.as_deref().map(str::trim) {
            None | Some("") => Role::User,
            Some(value) => {
                Role::try_from(value).map_err(|_| AppError::bad_request("Invalid role"))?
            }
        };

        if self.user_dao.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered.into());
        }

        let password_hash = self.hasher.hash(&input.password)?;
        let created = self
            .user_dao
            .create_user(&email, &password_hash, full_name, role.as_str())
            .await;

        let user = match created {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same email.
            Err(DaoLayerError::Db(err))
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                return Err(AuthError::EmailAlreadyRegistered.into());
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(user_id = %user.id, role = %role, "user registered");
        Ok(UserView::try_from(user)?)
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<user::Model>, AuthError> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn view(&self, id: &Uuid) -> Result<UserView, AuthError> {
        let user = self.find_by_id(id).await?.ok_or(AuthError::NotFound)?;
        UserView::try_from(user)
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{RegisterInput, UserService, is_plausible_email, normalize_email};
    use crate::{
        auth::Role,
        db::{dao::DaoContext, entities::user},
        error::AppError,
        test_helpers::PlainTextHasher,
    };

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn user_model(email: &str, role: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            email: email.to_string(),
            password_hash: "plain:password123".to_string(),
            full_name: "Alice Example".to_string(),
            role: role.to_string(),
            is_active: true,
        }
    }

    fn service(mock: MockDatabase) -> UserService {
        let db = mock.into_connection();
        UserService::new(DaoContext::new(&db).user(), Arc::new(PlainTextHasher))
    }

    fn input(email: &str, password: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: password.to_string(),
            full_name: "Alice Example".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn normalizes_and_checks_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert!(is_plausible_email("alice@example.com"));
        assert!(!is_plausible_email("alice.example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@"));
    }

    #[tokio::test]
    async fn rejects_short_and_overlong_passwords() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let short = service
            .register(input("alice@example.com", "short", None))
            .await
            .expect_err("short password should fail");
        assert!(matches!(short, AppError::BadRequest(_)));

        let long = service
            .register(input("alice@example.com", &"x".repeat(73), None))
            .await
            .expect_err("long password should fail");
        assert!(matches!(long, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_role() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = service
            .register(input("alice@example.com", "password123", Some("root")))
            .await
            .expect_err("unknown role should fail");
        assert_eq!(err.message(), "Invalid role");
    }

    #[tokio::test]
    async fn rejects_existing_email_with_conflict() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user_model("alice@example.com", "user")]]),
        );

        let err = service
            .register(input("Alice@Example.com", "password123", None))
            .await
            .expect_err("duplicate should fail");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn registers_with_requested_role() {
        let created = user_model("bob@example.com", "readonly");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[created.clone()]]),
        );

        let view = service
            .register(input("bob@example.com", "password123", Some("readonly")))
            .await
            .expect("registration should succeed");
        assert_eq!(view.id, created.id);
        assert_eq!(view.role, Role::Readonly);
        assert!(view.is_active);
    }
}

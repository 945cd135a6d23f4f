use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, FixedOffset, Utc};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, IntoCondition},
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::Session, session};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Client details recorded with a session row; absent stays `None`, never "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceMeta {
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct SessionDao {
    db: DatabaseConnection,
}

impl DaoBase for SessionDao {
    type Entity = Session;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// 256 random bits, URL-safe so the token travels in headers and cookies as is.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl SessionDao {
    /// Starts a new family with a root row.
    pub async fn create_root(
        &self,
        user_id: Uuid,
        meta: DeviceMeta,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<session::Model> {
        let model = session::ActiveModel {
            user_id: Set(user_id),
            refresh_token: Set(generate_refresh_token()),
            token_family: Set(Uuid::new_v4()),
            is_revoked: Set(false),
            device_name: Set(meta.device_name),
            ip_address: Set(meta.ip_address),
            user_agent: Set(meta.user_agent),
            expires_at: Set(expires_at),
            parent_token_id: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_token(&self, token: &str) -> DaoResult<Option<session::Model>> {
        Session::find()
            .filter(session::Column::RefreshToken.eq(token))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Revokes `parent` and appends its successor in one transaction.
    ///
    /// The revoke only matches a live row, so of two callers racing on the same
    /// parent exactly one commits a child; the other gets `AlreadyRevoked`.
    pub async fn rotate(
        &self,
        parent: &session::Model,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<session::Model> {
        let now = Utc::now().fixed_offset();
        let txn = self.db.begin().await.map_err(DaoLayerError::Db)?;

        let revoked = Session::update_many()
            .col_expr(session::Column::IsRevoked, Expr::value(true))
            .col_expr(session::Column::LastUsedAt, Expr::value(now))
            .filter(session::Column::Id.eq(parent.id))
            .filter(session::Column::IsRevoked.eq(false))
            .exec(&txn)
            .await
            .map_err(DaoLayerError::Db)?;

        if revoked.rows_affected == 0 {
            txn.rollback().await.map_err(DaoLayerError::Db)?;
            return Err(DaoLayerError::AlreadyRevoked { id: parent.id });
        }

        let child = session::ActiveModel {
            id: Set(Uuid::new_v4()),
            created_at: Set(now),
            last_used_at: Set(now),
            user_id: Set(parent.user_id),
            refresh_token: Set(generate_refresh_token()),
            token_family: Set(parent.token_family),
            is_revoked: Set(false),
            device_name: Set(parent.device_name.clone()),
            ip_address: Set(parent.ip_address.clone()),
            user_agent: Set(parent.user_agent.clone()),
            expires_at: Set(expires_at),
            parent_token_id: Set(Some(parent.id)),
        }
        .insert(&txn)
        .await
        .map_err(DaoLayerError::Db)?;

        txn.commit().await.map_err(DaoLayerError::Db)?;
        Ok(child)
    }

    pub async fn revoke(&self, id: Uuid) -> DaoResult<u64> {
        self.revoke_where(session::Column::Id.eq(id)).await
    }

    pub async fn revoke_by_token(&self, token: &str) -> DaoResult<u64> {
        self.revoke_where(session::Column::RefreshToken.eq(token)).await
    }

    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> DaoResult<u64> {
        self.revoke_where(session::Column::UserId.eq(user_id)).await
    }

    pub async fn revoke_family(&self, token_family: Uuid) -> DaoResult<u64> {
        self.revoke_where(session::Column::TokenFamily.eq(token_family)).await
    }

    // Already revoked rows are left alone so repeated calls change nothing.
    async fn revoke_where(&self, condition: impl IntoCondition) -> DaoResult<u64> {
        let result = Session::update_many()
            .col_expr(session::Column::IsRevoked, Expr::value(true))
            .filter(condition)
            .filter(session::Column::IsRevoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }

    pub async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<FixedOffset>,
    ) -> DaoResult<Vec<session::Model>> {
        Session::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::IsRevoked.eq(false))
            .filter(session::Column::ExpiresAt.gt(now))
            .order_by_desc(session::Column::LastUsedAt)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Every row of a family, oldest first.
    pub async fn list_family(&self, token_family: Uuid) -> DaoResult<Vec<session::Model>> {
        Session::find()
            .filter(session::Column::TokenFamily.eq(token_family))
            .order_by_asc(session::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn purge_expired(&self, now: DateTime<FixedOffset>) -> DaoResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use crate::db::entities::session;

    use super::{SessionDao, generate_refresh_token};
    use crate::db::dao::{DaoBase, DaoLayerError};

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn session_model(token: &str, family: Uuid, parent: Option<Uuid>) -> session::Model {
        session::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            last_used_at: ts(),
            user_id: Uuid::new_v4(),
            refresh_token: token.to_string(),
            token_family: family,
            is_revoked: false,
            device_name: Some("Chrome / Linux".to_string()),
            ip_address: None,
            user_agent: None,
            expires_at: ts() + Duration::days(7),
            parent_token_id: parent,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[test]
    fn refresh_tokens_are_url_safe_and_distinct() {
        let first = generate_refresh_token();
        let second = generate_refresh_token();

        assert_eq!(first.len(), 43);
        assert_ne!(first, second);
        assert!(
            first
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[tokio::test]
    async fn find_by_token_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<session::Model>::new()])
            .into_connection();
        let dao = SessionDao::new(&db);

        let result = dao
            .find_by_token("missing-token")
            .await
            .expect("query should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn rotate_reports_lost_race_when_parent_already_revoked() {
        let parent = session_model("token-1", Uuid::new_v4(), None);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let dao = SessionDao::new(&db);

        let err = dao
            .rotate(&parent, ts() + Duration::days(7))
            .await
            .expect_err("rotation should lose the race");
        assert!(matches!(err, DaoLayerError::AlreadyRevoked { id } if id == parent.id));
    }

    #[tokio::test]
    async fn rotate_returns_child_in_same_family() {
        let family = Uuid::new_v4();
        let parent = session_model("token-1", family, None);
        let child = session_model("token-2", family, Some(parent.id));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1)])
            .append_query_results([[child.clone()]])
            .into_connection();
        let dao = SessionDao::new(&db);

        let rotated = dao
            .rotate(&parent, ts() + Duration::days(7))
            .await
            .expect("rotation should succeed");
        assert_eq!(rotated.token_family, family);
        assert_eq!(rotated.parent_token_id, Some(parent.id));
    }

    #[tokio::test]
    async fn revoke_family_reports_rows_changed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(3), exec(0)])
            .into_connection();
        let dao = SessionDao::new(&db);
        let family = Uuid::new_v4();

        assert_eq!(dao.revoke_family(family).await.expect("first revoke"), 3);
        assert_eq!(dao.revoke_family(family).await.expect("second revoke"), 0);
    }

    #[tokio::test]
    async fn revoke_maps_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("update failed".to_string())])
            .into_connection();
        let dao = SessionDao::new(&db);

        let err = dao
            .revoke(Uuid::new_v4())
            .await
            .expect_err("update should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[tokio::test]
    async fn purge_expired_returns_deleted_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(5)])
            .into_connection();
        let dao = SessionDao::new(&db);

        let purged = dao.purge_expired(ts()).await.expect("purge should succeed");
        assert_eq!(purged, 5);
    }
}

use sea_orm::{ActiveValue::Set, entity::prelude::*};

use crate::db::dao::base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};

/// One row per issued refresh token. Rows of a login share `token_family` and
/// link to their predecessor through `parent_token_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub last_used_at: DateTimeWithTimeZone,
    #[sea_orm(indexed)]
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub refresh_token: String,
    #[sea_orm(indexed)]
    pub token_family: Uuid,
    #[sea_orm(default_value = false)]
    pub is_revoked: bool,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[sea_orm(indexed)]
    pub expires_at: DateTimeWithTimeZone,
    // Not a foreign key: expired parents are purged while children may live on.
    pub parent_token_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "user_id", to = "id", on_delete = "Cascade")]
    pub user: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_expired_at(&self, now: DateTimeWithTimeZone) -> bool {
        self.expires_at <= now
    }
}

impl HasIdActiveModel for ActiveModel {
    fn set_id(&mut self, id: Uuid) {
        self.id = Set(id);
    }
}

// Sessions have no separate update stamp; any touch counts as use.
impl TimestampedActiveModel for ActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone) {
        self.created_at = Set(ts);
    }

    fn set_updated_at(&mut self, ts: DateTimeWithTimeZone) {
        self.last_used_at = Set(ts);
    }
}

impl HasCreatedAtColumn for Entity {
    fn created_at_column() -> Column {
        Column::CreatedAt
    }
}

use sea_orm::{ActiveValue::Set, entity::prelude::*};

use crate::db::dao::base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(has_many)]
    pub sessions: HasMany<super::session::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl HasIdActiveModel for ActiveModel {
    fn set_id(&mut self, id: Uuid) {
        self.id = Set(id);
    }
}

impl TimestampedActiveModel for ActiveModel {
    fn set_created_at(&mut self, ts: DateTimeWithTimeZone) {
        self.created_at = Set(ts);
    }

    fn set_updated_at(&mut self, ts: DateTimeWithTimeZone) {
        self.updated_at = Set(ts);
    }
}

impl HasCreatedAtColumn for Entity {
    fn created_at_column() -> Column {
        Column::CreatedAt
    }
}

use sea_orm::DatabaseConnection;

use super::{DaoBase, SessionDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn session(&self) -> SessionDao {
        DaoBase::new(&self.db)
    }
}

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::PasswordHasher, db::dao::DaoContext, services::user_service::UserService};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    hasher: Arc<dyn PasswordHasher>,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            daos: DaoContext::new(db),
            hasher,
        }
    }

    pub fn daos(&self) -> &DaoContext {
        &self.daos
    }

    pub fn hasher(&self) -> Arc<dyn PasswordHasher> {
        Arc::clone(&self.hasher)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.hasher())
    }
}

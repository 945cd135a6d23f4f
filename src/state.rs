use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{AuthGateway, SessionManager, bootstrap::AuthComponents},
    config::AppConfig,
    services::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub services: ServiceContext,
    pub sessions: SessionManager,
    pub gateway: AuthGateway,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        services: ServiceContext,
        auth: AuthComponents,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            services,
            sessions: auth.sessions,
            gateway: auth.gateway,
        })
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    pub fn database(&self) -> Result<&DatabaseConfig> {
        self.database
            .as_ref()
            .context("database config is required (set APP_DATABASE__URL)")
    }

    pub fn auth(&self) -> Result<&AuthConfig> {
        self.auth
            .as_ref()
            .context("auth config is required (set APP_AUTH__JWT_SECRET)")
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT,
            request_timeout_secs: defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    #[serde(default = "default_session_sweep_interval_secs")]
    pub session_sweep_interval_secs: u64,
}

impl AuthConfig {
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: default_jwt_issuer(),
            refresh_ttl_days: default_refresh_ttl_days(),
            session_sweep_interval_secs: default_session_sweep_interval_secs(),
        }
    }
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE
}

fn default_jwt_issuer() -> String {
    defaults::DEFAULT_JWT_ISSUER.to_string()
}

fn default_refresh_ttl_days() -> i64 {
    defaults::DEFAULT_REFRESH_TTL_DAYS
}

fn default_session_sweep_interval_secs() -> u64 {
    defaults::DEFAULT_SESSION_SWEEP_INTERVAL_SECS
}

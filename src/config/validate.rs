use anyhow::{Result, bail};

use super::AppConfig;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if cfg.general.request_timeout_secs == 0 {
        errors.push("general.request_timeout_secs must be > 0".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.issuer.trim().is_empty() {
            errors.push("auth.issuer must not be empty".to_string());
        }

        if auth.refresh_ttl_days <= 0 {
            errors.push("auth.refresh_ttl_days must be > 0".to_string());
        }

        if auth.session_sweep_interval_secs == 0 {
            errors.push("auth.session_sweep_interval_secs must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig};

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_problem_at_once() {
        let mut cfg = AppConfig::default();
        cfg.database = Some(DatabaseConfig {
            url: " ".to_string(),
            max_connections: 1,
            min_idle: 4,
        });
        let mut auth = AuthConfig::with_secret("");
        auth.refresh_ttl_days = 0;
        cfg.auth = Some(auth);

        let message = validate(&cfg).expect_err("config should be rejected").to_string();

        assert!(message.contains("database.url must not be empty"));
        assert!(message.contains("database.min_idle (4)"));
        assert!(message.contains("auth.jwt_secret must not be empty"));
        assert!(message.contains("auth.refresh_ttl_days must be > 0"));
    }

    #[test]
    fn auth_defaults_follow_session_policy() {
        let auth = AuthConfig::with_secret("secret");

        assert_eq!(auth.issuer, "wms-lite");
        assert_eq!(auth.refresh_ttl_days, 7);
        assert_eq!(auth.session_sweep_interval_secs, 3600);
    }
}

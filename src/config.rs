//! Process-wide configuration, read once from the environment at startup.

use std::{env, fmt::Display, str::FromStr};

use bcrypt::DEFAULT_COST;
use thiserror::Error;

use crate::db::DbConfig;

/// Placeholder secret used outside production when `JWT_SECRET` is unset.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureSecret,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone)]
pub enum AdminPassword {
    Plain(String),
    Hashed(String),
}

/// Administrator seeded at startup when none exists with this email.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub name: String,
    pub password: AdminPassword,
}

#[derive(Clone)]
pub struct Config {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub log_level: Option<String>,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub database: Option<DbConfig>,
    pub smtp: Option<SmtpConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            log_level: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            bcrypt_cost: DEFAULT_COST,
            database: None,
            smtp: None,
            bootstrap_admin: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = var("JWT_SECRET").unwrap_or(defaults.jwt_secret);

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DbConfig {
                url,
                max_connections: parse_var("DB_POOL_MAX", 10)?,
                min_connections: parse_var("DB_POOL_MIN", 2)?,
                connect_timeout_secs: parse_var("DB_CONNECT_TIMEOUT", 10)?,
                idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT", 300)?,
            }),
            None => None,
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => {
                let username = var("SMTP_USERNAME").unwrap_or_default();
                Some(SmtpConfig {
                    host,
                    port: parse_var("SMTP_PORT", 587)?,
                    from: var("MAIL_FROM").unwrap_or_else(|| username.clone()),
                    password: var("SMTP_PASSWORD").unwrap_or_default(),
                    username,
                })
            }
            None => None,
        };

        let bootstrap_admin = var("ADMIN_EMAIL").and_then(|email| {
            let password = var("ADMIN_HASH_PASSWORD")
                .map(AdminPassword::Hashed)
                .or_else(|| var("ADMIN_PASSWORD").map(AdminPassword::Plain))?;
            Some(BootstrapAdmin {
                email,
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                password,
            })
        });

        let allowed_origins = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| var("FRONTEND_ORIGIN").map(|origin| vec![origin]))
            .unwrap_or(defaults.allowed_origins);

        let config = Self {
            environment,
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port)?,
            log_level: var("LOG_LEVEL"),
            jwt_secret,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            database,
            smtp,
            bootstrap_admin,
            allowed_origins,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuses to run production with the placeholder signing secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production()
            && (self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET)
        {
            return Err(ConfigError::InsecureSecret);
        }
        Ok(())
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_in_development() {
        let config = Config::default();
        assert!(!config.is_production());
        assert!(config.validate().is_ok());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InsecureSecret)));
    }

    #[test]
    fn test_production_accepts_custom_secret() {
        let config = Config {
            environment: "production".to_string(),
            jwt_secret: "a-long-random-value".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}

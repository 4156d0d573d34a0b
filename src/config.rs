// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, their defaults, and the [`Config`] value built
//! from them at startup. A `.env` file in the working directory is loaded
//! first when present; real environment variables win. Empty values count as
//! unset.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3200` |
//! | `DATABASE_URL` | Postgres URL for user/role lookups | unset (empty in-memory directory) |
//! | `DATABASE_MAX_CONNECTIONS` | Pool size | `10` |
//! | `API_DOMAIN` | PostgREST base URL | `http://localhost:3000` |
//! | `ENCRYPT_KEY` | 16-byte AES key shared with the clients | `1234567890123456` |
//! | `ENCRYPT_IV` | 16-byte AES IV shared with the clients | `1234567890123456` |
//! | `JWT_SECRET` | HS256 signing secret | `default_secret` |
//! | `JWT_EXPIRES_IN` / `JWT_EXPIRES` | Token lifetime, seconds or `1h`-style | `1h` |
//! | `USE_SERVICE_TOKEN` | `1` to sign data-service writes | off |
//! | `EMAIL` / `EMAIL_PASSWORD` | SMTP login and sender | unset (mail disabled) |
//! | `SMTP_HOST` / `SMTP_PORT` | SMTP relay | `smtp.office365.com` / `587` |
//! | `MAIL_TEMPLATE_DIR` | Directory of `<name>.html` mail templates | `templates/mail` |
//! | `APP_ENV` / `NODE_ENV` | Environment name; `test` disables encryption | `development` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::auth::tokens::InvalidExpiry;
use crate::auth::TokenExpiry;
use crate::logging::LogFormat;
use crate::providers::data_api::DEFAULT_API_DOMAIN;
use crate::providers::mailer::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT, DEFAULT_TEMPLATE_DIR};
use crate::providers::SmtpSettings;
use crate::store::PostgresConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS_ENV: &str = "DATABASE_MAX_CONNECTIONS";
pub const API_DOMAIN_ENV: &str = "API_DOMAIN";
pub const ENCRYPT_KEY_ENV: &str = "ENCRYPT_KEY";
pub const ENCRYPT_IV_ENV: &str = "ENCRYPT_IV";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
/// Older name for `JWT_EXPIRES_IN`, still read as a fallback.
pub const JWT_EXPIRES_ENV: &str = "JWT_EXPIRES";
pub const USE_SERVICE_TOKEN_ENV: &str = "USE_SERVICE_TOKEN";
pub const EMAIL_ENV: &str = "EMAIL";
pub const EMAIL_PASSWORD_ENV: &str = "EMAIL_PASSWORD";
pub const SMTP_HOST_ENV: &str = "SMTP_HOST";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";
pub const MAIL_TEMPLATE_DIR_ENV: &str = "MAIL_TEMPLATE_DIR";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const NODE_ENV_ENV: &str = "NODE_ENV";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3200;
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DATABASE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Development key and IV. Deployments must override both.
pub const DEFAULT_ENCRYPT_KEY: &str = "1234567890123456";
pub const DEFAULT_ENCRYPT_IV: &str = "1234567890123456";
pub const DEFAULT_JWT_SECRET: &str = "default_secret";
pub const DEFAULT_ENV_NAME: &str = "development";

/// Environment name that switches responses to plaintext.
const TEST_ENV_NAME: &str = "test";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error(transparent)]
    InvalidExpiry(#[from] InvalidExpiry),

    #[error("LOG_FORMAT: {0}")]
    InvalidLogFormat(String),
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: Option<PostgresConfig>,
    pub api_domain: String,
    pub encrypt_key: String,
    pub encrypt_iv: String,
    pub jwt_secret: String,
    pub token_expiry: TokenExpiry,
    pub use_service_token: bool,
    pub smtp: SmtpSettings,
    pub mail_template_dir: PathBuf,
    pub env_name: String,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("api_domain", &self.api_domain)
            .field("token_expiry", &self.token_expiry)
            .field("use_service_token", &self.use_service_token)
            .field("smtp", &self.smtp)
            .field("mail_template_dir", &self.mail_template_dir)
            .field("env_name", &self.env_name)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_number(PORT_ENV, get(PORT_ENV))?.unwrap_or(DEFAULT_PORT);

        let database = match get(DATABASE_URL_ENV) {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: parse_number(
                    DATABASE_MAX_CONNECTIONS_ENV,
                    get(DATABASE_MAX_CONNECTIONS_ENV),
                )?
                .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                acquire_timeout: DATABASE_ACQUIRE_TIMEOUT,
            }),
            None => None,
        };

        let token_expiry = match get(JWT_EXPIRES_IN_ENV).or_else(|| get(JWT_EXPIRES_ENV)) {
            Some(value) => TokenExpiry::parse(&value)?,
            None => TokenExpiry::default(),
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(value) => value
                .parse::<LogFormat>()
                .map_err(ConfigError::InvalidLogFormat)?,
            None => LogFormat::default(),
        };

        let smtp = SmtpSettings {
            host: get(SMTP_HOST_ENV).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port: parse_number(SMTP_PORT_ENV, get(SMTP_PORT_ENV))?.unwrap_or(DEFAULT_SMTP_PORT),
            email: get(EMAIL_ENV),
            password: get(EMAIL_PASSWORD_ENV),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database,
            api_domain: get(API_DOMAIN_ENV).unwrap_or_else(|| DEFAULT_API_DOMAIN.to_string()),
            encrypt_key: get(ENCRYPT_KEY_ENV).unwrap_or_else(|| DEFAULT_ENCRYPT_KEY.to_string()),
            encrypt_iv: get(ENCRYPT_IV_ENV).unwrap_or_else(|| DEFAULT_ENCRYPT_IV.to_string()),
            jwt_secret: get(JWT_SECRET_ENV).unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_expiry,
            use_service_token: get(USE_SERVICE_TOKEN_ENV).is_some_and(|v| v.trim() == "1"),
            smtp,
            mail_template_dir: get(MAIL_TEMPLATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_DIR)),
            env_name: get(APP_ENV_ENV)
                .or_else(|| get(NODE_ENV_ENV))
                .unwrap_or_else(|| DEFAULT_ENV_NAME.to_string()),
            log_format,
        })
    }

    /// In the `test` environment responses are returned unencrypted.
    pub fn plain_responses(&self) -> bool {
        self.env_name.eq_ignore_ascii_case(TEST_ENV_NAME)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Log a warning for every secret still at its development default.
    pub fn warn_on_default_secrets(&self) {
        if self.encrypt_key == DEFAULT_ENCRYPT_KEY || self.encrypt_iv == DEFAULT_ENCRYPT_IV {
            warn!("{ENCRYPT_KEY_ENV}/{ENCRYPT_IV_ENV} not set; using the development key");
        }
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("{JWT_SECRET_ENV} not set; tokens are signed with the development secret");
        }
        if self.database.is_none() {
            warn!("{DATABASE_URL_ENV} not set; the user directory is empty and every login will fail");
        }
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name,
                value: v.clone(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3200");
        assert!(config.database.is_none());
        assert_eq!(config.api_domain, "http://localhost:3000");
        assert_eq!(config.encrypt_key, DEFAULT_ENCRYPT_KEY);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.token_expiry, TokenExpiry::default());
        assert!(!config.use_service_token);
        assert_eq!(config.smtp.host, "smtp.office365.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.email.is_none());
        assert_eq!(config.env_name, "development");
        assert!(!config.plain_responses());
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config(&[("PORT", ""), ("JWT_SECRET", "  ")]).unwrap();
        assert_eq!(config.port, 3200);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://localhost/tpf"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("JWT_EXPIRES_IN", "120"),
            ("USE_SERVICE_TOKEN", "1"),
            ("EMAIL", "nav@example.com"),
            ("NODE_ENV", "test"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.port, 8081);
        assert_eq!(config.database.as_ref().unwrap().max_connections, 3);
        assert_eq!(config.token_expiry, TokenExpiry::Seconds(120));
        assert!(config.use_service_token);
        assert_eq!(config.smtp.email.as_deref(), Some("nav@example.com"));
        assert!(config.plain_responses());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn app_env_wins_over_node_env() {
        let config = config(&[("APP_ENV", "production"), ("NODE_ENV", "test")]).unwrap();
        assert_eq!(config.env_name, "production");
        assert!(!config.plain_responses());
    }

    #[test]
    fn legacy_expiry_name_is_a_fallback() {
        let config = config(&[("JWT_EXPIRES", "2h")]).unwrap();
        assert_eq!(config.token_expiry, TokenExpiry::Duration("2h".into()));

        let config = self::config(&[("JWT_EXPIRES", "2h"), ("JWT_EXPIRES_IN", "30m")]).unwrap();
        assert_eq!(config.token_expiry, TokenExpiry::Duration("30m".into()));
    }

    #[test]
    fn only_literal_one_enables_service_token() {
        assert!(!config(&[("USE_SERVICE_TOKEN", "true")]).unwrap().use_service_token);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("PORT", "http")]),
            Err(ConfigError::InvalidNumber { name: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRES_IN", "soon")]),
            Err(ConfigError::InvalidExpiry(_))
        ));
        assert!(matches!(
            config(&[("JWT_EXPIRES_IN", "500ms")]),
            Err(ConfigError::InvalidExpiry(_))
        ));
        assert!(matches!(
            config(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config(&[("JWT_SECRET", "hunter2"), ("ENCRYPT_KEY", "abcdefghijklmnop")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("abcdefghijklmnop"));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_AUTH_SECRET_KEY` | Token signing key | **Required** |
//! | `SITE_URL` | Base URL of the service, used as token issuer | `http://localhost:8080` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_VALIDITY_SECS` | Token lifetime in seconds, at most 10 years | `604800` (7 days) |
//! | `USER_STORE_TIMEOUT_MS` | Deadline for one user store call | `5000` |
//! | `AUTH_FALLBACK_HEADER` | Header checked when proxies rewrite `Authorization` | `x-forwarded-authorization` |
//! | `JWT_AUTH_CORS_ENABLE` | Allow cross-origin requests carrying `Authorization` | `false` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origin allowlist | any origin |
//! | `SEED_USER_LOGIN` | Bootstrap account login (with `SEED_USER_PASSWORD`) | unset |
//! | `SEED_USER_PASSWORD` | Bootstrap account password | unset |
//! | `SEED_USER_EMAIL` | Bootstrap account e-mail | `<login>@localhost` |
//! | `SEED_USER_ROLE` | Bootstrap account role | `administrator` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use axum::http::HeaderName;
use url::Url;

use crate::auth::codec::SigningKey;
use crate::auth::extractor::DEFAULT_FALLBACK_HEADER;
use crate::auth::service::{
    DEFAULT_STORE_TIMEOUT, DEFAULT_TOKEN_VALIDITY_SECS, MAX_TOKEN_VALIDITY_SECS,
};

/// Environment variable name for the token signing key.
///
/// There is no fallback: startup fails when this is unset or empty.
pub const SIGNING_KEY_ENV: &str = "JWT_AUTH_SECRET_KEY";
pub const SITE_URL_ENV: &str = "SITE_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TOKEN_VALIDITY_ENV: &str = "TOKEN_VALIDITY_SECS";
pub const STORE_TIMEOUT_ENV: &str = "USER_STORE_TIMEOUT_MS";
pub const FALLBACK_HEADER_ENV: &str = "AUTH_FALLBACK_HEADER";
pub const CORS_ENABLE_ENV: &str = "JWT_AUTH_CORS_ENABLE";
pub const CORS_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const SEED_LOGIN_ENV: &str = "SEED_USER_LOGIN";
pub const SEED_PASSWORD_ENV: &str = "SEED_USER_PASSWORD";
pub const SEED_EMAIL_ENV: &str = "SEED_USER_EMAIL";
pub const SEED_ROLE_ENV: &str = "SEED_USER_ROLE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SITE_URL: &str = "http://localhost:8080";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_AUTH_SECRET_KEY must be set to a non-empty secret")]
    MissingSigningKey,
    #[error("SITE_URL is not a valid absolute URL: {0}")]
    InvalidSiteUrl(String),
    #[error("{name} must be a positive number, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("TOKEN_VALIDITY_SECS must be at most 315360000 (10 years), got {0}")]
    ValidityTooLong(u64),
    #[error("AUTH_FALLBACK_HEADER is not a valid header name: {0}")]
    InvalidHeaderName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Bootstrap account created in the in-memory user store.
#[derive(Clone)]
pub struct SeedUser {
    pub login: String,
    pub password: String,
    pub email: String,
    pub role: String,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("login", &self.login)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub signing_key: SigningKey,
    /// Issuer claim, without a trailing slash
    pub site_url: String,
    pub host: String,
    pub port: u16,
    pub token_validity_secs: i64,
    pub store_timeout: Duration,
    pub fallback_header: HeaderName,
    pub cors_enabled: bool,
    pub cors_allowed_origins: Vec<String>,
    pub seed_user: Option<SeedUser>,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let signing_key = var(SIGNING_KEY_ENV)
            .and_then(SigningKey::new)
            .ok_or(ConfigError::MissingSigningKey)?;

        let site_url = var(SITE_URL_ENV).unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
        let parsed = Url::parse(&site_url)
            .map_err(|e| ConfigError::InvalidSiteUrl(format!("{site_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidSiteUrl(site_url));
        }
        let site_url = site_url.trim_end_matches('/').to_string();

        let port = parse_positive(PORT_ENV, var(PORT_ENV), DEFAULT_PORT as u64)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::InvalidNumber {
            name: PORT_ENV,
            value: port.to_string(),
        })?;

        let token_validity_secs = parse_positive(
            TOKEN_VALIDITY_ENV,
            var(TOKEN_VALIDITY_ENV),
            DEFAULT_TOKEN_VALIDITY_SECS as u64,
        )?;
        let token_validity_secs = i64::try_from(token_validity_secs)
            .ok()
            .filter(|secs| *secs <= MAX_TOKEN_VALIDITY_SECS)
            .ok_or(ConfigError::ValidityTooLong(token_validity_secs))?;

        let store_timeout_ms = parse_positive(
            STORE_TIMEOUT_ENV,
            var(STORE_TIMEOUT_ENV),
            DEFAULT_STORE_TIMEOUT.as_millis() as u64,
        )?;

        let fallback_header = var(FALLBACK_HEADER_ENV)
            .unwrap_or_else(|| DEFAULT_FALLBACK_HEADER.to_string());
        let fallback_header = HeaderName::try_from(fallback_header.to_ascii_lowercase())
            .map_err(|_| ConfigError::InvalidHeaderName(fallback_header))?;

        let cors_enabled = var(CORS_ENABLE_ENV)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let cors_allowed_origins = var(CORS_ORIGINS_ENV)
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let seed_user = match (var(SEED_LOGIN_ENV), var(SEED_PASSWORD_ENV)) {
            (Some(login), Some(password)) => Some(SeedUser {
                email: var(SEED_EMAIL_ENV).unwrap_or_else(|| format!("{login}@localhost")),
                role: var(SEED_ROLE_ENV).unwrap_or_else(|| "administrator".to_string()),
                login,
                password,
            }),
            _ => None,
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            signing_key,
            site_url,
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            token_validity_secs,
            store_timeout: Duration::from_millis(store_timeout_ms),
            fallback_header,
            cors_enabled,
            cors_allowed_origins,
            seed_user,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_positive(
    name: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn missing_signing_key_is_fatal() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSigningKey)));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "   ")]),
            Err(ConfigError::MissingSigningKey)
        ));
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(SIGNING_KEY_ENV, "secret")]).unwrap();
        assert_eq!(config.site_url, "http://localhost:8080");
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.token_validity_secs, 604_800);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.fallback_header.as_str(), "x-forwarded-authorization");
        assert!(!config.cors_enabled);
        assert!(config.cors_allowed_origins.is_empty());
        assert!(config.seed_user.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (SIGNING_KEY_ENV, "secret"),
            (SITE_URL_ENV, "https://cms.example.com/"),
            (PORT_ENV, "9000"),
            (TOKEN_VALIDITY_ENV, "3600"),
            (STORE_TIMEOUT_ENV, "250"),
            (FALLBACK_HEADER_ENV, "X-Authorization"),
            (CORS_ENABLE_ENV, "true"),
            (CORS_ORIGINS_ENV, "https://a.example.com, https://b.example.com/"),
            (LOG_FORMAT_ENV, "json"),
        ])
        .unwrap();
        assert_eq!(config.site_url, "https://cms.example.com");
        assert_eq!(config.port, 9000);
        assert_eq!(config.token_validity_secs, 3600);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.fallback_header.as_str(), "x-authorization");
        assert!(config.cors_enabled);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (SITE_URL_ENV, "not a url")]),
            Err(ConfigError::InvalidSiteUrl(_))
        ));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (PORT_ENV, "70000")]),
            Err(ConfigError::InvalidNumber { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (TOKEN_VALIDITY_ENV, "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (FALLBACK_HEADER_ENV, "bad header")]),
            Err(ConfigError::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn validity_window_is_bounded() {
        let config = load(&[(SIGNING_KEY_ENV, "secret"), (TOKEN_VALIDITY_ENV, "315360000")])
            .unwrap();
        assert_eq!(config.token_validity_secs, MAX_TOKEN_VALIDITY_SECS);

        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (TOKEN_VALIDITY_ENV, "315360001")]),
            Err(ConfigError::ValidityTooLong(315_360_001))
        ));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (TOKEN_VALIDITY_ENV, "9223372036854775807")]),
            Err(ConfigError::ValidityTooLong(_))
        ));
        assert!(matches!(
            load(&[(SIGNING_KEY_ENV, "secret"), (TOKEN_VALIDITY_ENV, "18446744073709551615")]),
            Err(ConfigError::ValidityTooLong(_))
        ));
    }

    #[test]
    fn seed_user_needs_login_and_password() {
        let config = load(&[(SIGNING_KEY_ENV, "secret"), (SEED_LOGIN_ENV, "admin")]).unwrap();
        assert!(config.seed_user.is_none());

        let config = load(&[
            (SIGNING_KEY_ENV, "secret"),
            (SEED_LOGIN_ENV, "admin"),
            (SEED_PASSWORD_ENV, "correct-pw"),
        ])
        .unwrap();
        let seed = config.seed_user.unwrap();
        assert_eq!(seed.email, "admin@localhost");
        assert_eq!(seed.role, "administrator");
        assert!(!format!("{seed:?}").contains("correct-pw"));
    }
}

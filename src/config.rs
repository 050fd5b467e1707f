use serde::Deserialize;
use thiserror::Error;

/// Minimum length of the HS256 signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_TTL_MINUTES: i64 = 60 * 24;
/// Ten years; keeps `now + ttl` well inside the representable date range.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string. Without it the service keeps users and items in memory.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: "must not be blank".into(),
            });
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            None => DEFAULT_TTL_MINUTES,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(v) if v > 0 && v <= MAX_TTL_MINUTES => v,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JWT_TTL_MINUTES",
                        reason: format!(
                            "expected 1..={} minutes, got {:?}",
                            MAX_TTL_MINUTES, raw
                        ),
                    })
                }
            },
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "freemarket".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "freemarket-users".into()),
            ttl_minutes,
        };

        let port = match lookup("APP_PORT") {
            None => 8080,
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "APP_PORT",
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
        })
    }
}

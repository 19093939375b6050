//! Configuration loading and representation.
//!
//! Everything comes from environment variables; a `.env` file in the working
//! directory is loaded first when present. Unset variables fall back to
//! defaults, malformed ones are an error.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Whether the movement audit record shares the stock mutation's transaction.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum MovementAudit {
    /// The movement is written in the same transaction; if it fails, the
    /// stock change is rolled back and the call fails.
    #[default]
    Atomic,
    /// The stock change commits first; the movement is appended afterwards and
    /// a failure is only logged as a warning.
    BestEffort,
}

impl FromStr for MovementAudit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(MovementAudit::Atomic),
            "best_effort" | "best-effort" => Ok(MovementAudit::BestEffort),
            _ => Err("expected 'atomic' or 'best_effort'".to_string()),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub bind_addr: SocketAddr,
    /// Deadline the adapters apply to each service call.
    pub request_timeout: Duration,
    pub movement_audit: MovementAudit,
}

impl AppConfig {
    /// Load from the process environment (after reading `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
                acquire_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "DB_ACQUIRE_TIMEOUT_MS",
                    5_000,
                )?),
                run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            }),
            None => None,
        };

        Ok(Self {
            database,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            request_timeout: Duration::from_millis(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_MS",
                10_000,
            )?),
            movement_audit: parse_or(&lookup, "MOVEMENT_AUDIT", MovementAudit::Atomic)?,
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_select_in_memory_store() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database, None);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.movement_audit, MovementAudit::Atomic);
    }

    #[test]
    fn database_settings_are_read_when_url_is_set() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/stockroom"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("RUN_MIGRATIONS", "false"),
            ("MOVEMENT_AUDIT", "best-effort"),
        ])
        .unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/stockroom");
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.acquire_timeout, Duration::from_secs(5));
        assert!(!db.run_migrations);
        assert_eq!(config.movement_audit, MovementAudit::BestEffort);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = load(&[("REQUEST_TIMEOUT_MS", "soon")]).unwrap_err();
        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "REQUEST_TIMEOUT_MS");
                assert_eq!(value, "soon");
            }
        }
        assert!(load(&[("MOVEMENT_AUDIT", "sometimes")]).is_err());
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert_eq!(load(&[("DATABASE_URL", "  ")]).unwrap().database, None);
    }
}

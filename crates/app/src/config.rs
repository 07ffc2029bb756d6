//! Application configuration loaded from environment variables.

use std::net::SocketAddr;

use domain::identity::AdminSeed;

use crate::error::AppError;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("unknown LOG_FORMAT '{other}'"))),
        }
    }
}

/// Host configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string; entities are kept in
///   memory when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `ADMIN_USER_NAME`, `ADMIN_PASSWORD`, `ADMIN_DISPLAY_NAME`: the seeded
///   administrator (default: `admin` / `Admin@123` / `Administrator`)
/// - `METRICS_ADDR`: serve Prometheus metrics over HTTP on this address
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub admin: AdminSeed,
    pub metrics_addr: Option<SocketAddr>,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's
    /// value or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::Config(format!("DATABASE_MAX_CONNECTIONS must be a number, got '{raw}'"))
            })?,
            None => defaults.database_max_connections,
        };

        let metrics_addr = var("METRICS_ADDR")
            .map(|raw| {
                raw.trim().parse().map_err(|_| {
                    AppError::Config(format!("METRICS_ADDR must be host:port, got '{raw}'"))
                })
            })
            .transpose()?;

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_max_connections,
            admin: AdminSeed {
                user_name: var("ADMIN_USER_NAME").unwrap_or(defaults.admin.user_name),
                password: var("ADMIN_PASSWORD").unwrap_or(defaults.admin.password),
                display_name: var("ADMIN_DISPLAY_NAME").unwrap_or(defaults.admin.display_name),
            },
            metrics_addr,
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
        })
    }

    /// Returns true when entities are persisted to PostgreSQL.
    pub fn uses_database(&self) -> bool {
        self.database_url.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            admin: AdminSeed {
                user_name: "admin".to_string(),
                password: "Admin@123".to_string(),
                display_name: "Administrator".to_string(),
            },
            metrics_addr: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

// The database URL may carry a password.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database", &self.database_url.as_ref().map(|_| "***"))
            .field("database_max_connections", &self.database_max_connections)
            .field("admin", &self.admin)
            .field("metrics_addr", &self.metrics_addr)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.admin.user_name, "admin");
        assert_eq!(config.admin.password, "Admin@123");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.uses_database());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.admin.display_name, "Administrator");
        assert_eq!(config.metrics_addr, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://app:secret@db/app"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("ADMIN_USER_NAME", "root"),
            ("METRICS_ADDR", "127.0.0.1:9000"),
            ("RUST_LOG", "debug"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert!(config.uses_database());
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.admin.user_name, "root");
        assert_eq!(config.admin.password, "Admin@123");
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(!config.uses_database());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("DATABASE_MAX_CONNECTIONS", "many")])).is_err());
        assert!(Config::from_lookup(lookup(&[("METRICS_ADDR", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://app:secret@db/app"),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("hunter22"));
    }
}

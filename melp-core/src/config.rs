//! Service configuration
//!
//! Loaded once at startup and passed down explicitly. Sources, lowest to
//! highest precedence:
//! - built-in defaults
//! - an optional TOML file
//! - environment variables (`MELP_*`, `DATABASE_*`)

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub project_name: String,
    /// Prefix the restaurant routes are mounted under (e.g. `/api/v1`)
    pub api_prefix: String,
    pub bind_addr: SocketAddr,
    /// Allow any CORS origin instead of localhost only
    pub cors_permissive: bool,
    pub request_timeout_secs: u64,
    pub database: DatabaseConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            project_name: "Melp Restaurants API".to_string(),
            api_prefix: "/api/v1".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_permissive: false,
            request_timeout_secs: 30,
            database: DatabaseConfig::default(),
        }
    }
}

/// PostgreSQL connection parameters
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "melp".to_string(),
            max_connections: 5,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl ServiceConfig {
    /// Load from an optional TOML file, then apply process environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.normalize()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MELP_PROJECT_NAME") {
            self.project_name = v;
        }
        if let Some(v) = lookup("MELP_API_PREFIX") {
            self.api_prefix = v;
        }
        if let Some(v) = lookup("MELP_BIND_ADDR") {
            self.bind_addr = parse_var("MELP_BIND_ADDR", &v)?;
        }
        if let Some(v) = lookup("MELP_CORS_PERMISSIVE") {
            self.cors_permissive = parse_var("MELP_CORS_PERMISSIVE", &v)?;
        }
        if let Some(v) = lookup("MELP_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("MELP_REQUEST_TIMEOUT_SECS", &v)?;
        }

        let db = &mut self.database;
        if let Some(v) = lookup("DATABASE_URL") {
            db.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_HOST") {
            db.host = v;
        }
        if let Some(v) = lookup("DATABASE_PORT") {
            db.port = parse_var("DATABASE_PORT", &v)?;
        }
        if let Some(v) = lookup("DATABASE_USER") {
            db.user = v;
        }
        if let Some(v) = lookup("DATABASE_PASSWORD") {
            db.password = v;
        }
        if let Some(v) = lookup("DATABASE_NAME") {
            db.name = v;
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            db.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        Ok(())
    }

    /// Canonicalize the API prefix and reject unusable values.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        let prefix = self.api_prefix.trim().trim_end_matches('/');
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "api_prefix",
                value: self.api_prefix.clone(),
                reason: "must start with '/'".to_string(),
            });
        }
        self.api_prefix = prefix.to_string();

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database.max_connections",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.api_prefix, "/api/v1");
        assert_eq!(config.bind_addr.port(), 8000);
        assert!(!config.cors_permissive);
        assert_eq!(config.database.port, 5432);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn env_overrides() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(lookup_from(&[
                ("MELP_BIND_ADDR", "0.0.0.0:9000"),
                ("MELP_CORS_PERMISSIVE", "true"),
                ("DATABASE_HOST", "db"),
                ("DATABASE_PORT", "6543"),
                ("DATABASE_PASSWORD", "hunter2"),
            ]))
            .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse().unwrap());
        assert!(config.cors_permissive);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.password, "hunter2");
    }

    #[test]
    fn invalid_env_value_is_reported() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env(lookup_from(&[("DATABASE_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "DATABASE_PORT",
                ..
            }
        ));
    }

    #[test]
    fn file_then_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_prefix = "/v2/"

[database]
url = "postgres://melp:secret@db/melp"
max_connections = 12
"#
        )
        .unwrap();

        let mut config = ServiceConfig::from_file(file.path()).unwrap();
        config.normalize().unwrap();

        assert_eq!(config.api_prefix, "/v2");
        assert_eq!(config.project_name, "Melp Restaurants API");
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://melp:secret@db/melp")
        );
        assert_eq!(config.database.max_connections, 12);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_addr = 42").unwrap();
        let err = ServiceConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn prefix_must_be_absolute() {
        let mut config = ServiceConfig {
            api_prefix: "api".to_string(),
            ..Default::default()
        };
        assert!(config.normalize().is_err());

        let mut config = ServiceConfig {
            api_prefix: "/".to_string(),
            ..Default::default()
        };
        config.normalize().unwrap();
        assert_eq!(config.api_prefix, "");
    }

    #[test]
    fn debug_redacts_secrets() {
        let db = DatabaseConfig {
            url: Some("postgres://u:topsecret@h/d".to_string()),
            password: "topsecret".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", db);
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("<redacted>"));
    }
}

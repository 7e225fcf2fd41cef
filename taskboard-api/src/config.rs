/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `TASKBOARD_API_SERVER_HOST`: Host to bind to (default: 0.0.0.0)
/// - `TASKBOARD_API_SERVER_PORT`: Port to bind to (default: 7000)
/// - `DATABASE_URL`: SQLite connection string (default: `sqlite://taskboard.sqlite3?mode=rwc`)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `STATIC_DIR`: Directory served under `/taskboard/static` (default: `./static`)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use taskboard_shared::db::pool::DEFAULT_DATABASE_URL;
use tracing::warn;

/// Port used when none (or an unusable one) is configured
pub const DEFAULT_PORT: u16 = 7000;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Directory holding static files (avatars)
    pub static_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                static_dir: PathBuf::from("./static"),
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 5,
            },
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_MAX_CONNECTIONS` is not a positive number.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Config::default();

        let host = lookup("TASKBOARD_API_SERVER_HOST")
            .filter(|host| !host.trim().is_empty())
            .unwrap_or(defaults.api.host);
        let port = parse_port(lookup("TASKBOARD_API_SERVER_PORT").as_deref());

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database.url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value.trim().parse::<u32>()?,
            None => defaults.database.max_connections,
        };
        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.api.cors_origins);

        let static_dir = lookup("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.api.static_dir);

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                static_dir,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Parses the configured port, falling back to [`DEFAULT_PORT`]
///
/// Missing, non-numeric and zero values all fall back.
pub fn parse_port(value: Option<&str>) -> u16 {
    match value.map(|v| v.trim().parse::<u16>()) {
        None => DEFAULT_PORT,
        Some(Ok(port)) if port > 0 => port,
        Some(_) => {
            warn!(value = ?value, default = DEFAULT_PORT, "Invalid server port, using default");
            DEFAULT_PORT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:7000");
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.api.static_dir, PathBuf::from("./static"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TASKBOARD_API_SERVER_HOST", "127.0.0.1"),
            ("TASKBOARD_API_SERVER_PORT", "8123"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
            ("STATIC_DIR", "/srv/taskboard"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8123");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.api.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.api.static_dir, PathBuf::from("/srv/taskboard"));
    }

    #[test]
    fn test_parse_port_falls_back() {
        assert_eq!(parse_port(None), 7000);
        assert_eq!(parse_port(Some("0")), 7000);
        assert_eq!(parse_port(Some("http")), 7000);
        assert_eq!(parse_port(Some("70000")), 7000);
        assert_eq!(parse_port(Some(" 9000 ")), 9000);
    }

    #[test]
    fn test_invalid_pool_size() {
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", "many")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", "0")])).is_err());
    }
}

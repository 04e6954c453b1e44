//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use toyrobot_client::ClientConfig;

/// Default port of the persistence API
pub const DEFAULT_API_PORT: u16 = 3000;

/// Default origin allowed by CORS (the web client's dev server)
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3001";

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage backend configuration
    pub store: StoreConfig,

    /// Settings the console uses to reach the API
    pub client: ClientConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Origin allowed to call the API from a browser
    pub cors_origin: String,
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Which backend holds the history
    pub kind: StoreKind,
    /// Connection string, required for PostgreSQL
    pub database_url: Option<String>,
}

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local history, lost on restart
    Memory,
    /// PostgreSQL `robot_states` table
    Postgres,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> DaemonResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("TOYROBOT_ENV") {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let api = Self::load_api_config(&lookup)?;
        let store = Self::load_store_config(&lookup)?;
        let client = Self::load_client_config(&lookup)?;

        Ok(Self {
            api,
            store,
            client,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            },
            store: StoreConfig {
                kind: StoreKind::Memory,
                database_url: None,
            },
            client: ClientConfig::default(),
            environment: Environment::Test,
        }
    }

    /// Address the API server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    fn load_api_config<F>(lookup: &F) -> DaemonResult<ApiConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("TOYROBOT_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("TOYROBOT_API_PORT") {
            Some(port_str) => port_str.parse::<u16>().map_err(|_| {
                DaemonError::Config(format!("Invalid TOYROBOT_API_PORT: {}", port_str))
            })?,
            None => DEFAULT_API_PORT,
        };
        let cors_origin =
            lookup("TOYROBOT_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        Ok(ApiConfig {
            host,
            port,
            cors_origin,
        })
    }

    fn load_store_config<F>(lookup: &F) -> DaemonResult<StoreConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = match lookup("TOYROBOT_STORE") {
            Some(value) => value.parse()?,
            None => StoreKind::Memory,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        if kind == StoreKind::Postgres && database_url.is_none() {
            return Err(DaemonError::Config(
                "DATABASE_URL is required when TOYROBOT_STORE=postgres".to_string(),
            ));
        }

        Ok(StoreConfig { kind, database_url })
    }

    fn load_client_config<F>(lookup: &F) -> DaemonResult<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ClientConfig::default();
        let base_url = lookup("TOYROBOT_API_URL").unwrap_or(defaults.base_url);
        let timeout = match lookup("TOYROBOT_CLIENT_TIMEOUT_MS") {
            Some(ms) => {
                let ms = ms.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or_else(|| {
                    DaemonError::Config(format!("Invalid TOYROBOT_CLIENT_TIMEOUT_MS: {}", ms))
                })?;
                Duration::from_millis(ms)
            },
            None => defaults.timeout,
        };

        Ok(ClientConfig { base_url, timeout })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_API_PORT,
                cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            },
            store: StoreConfig {
                kind: StoreKind::Memory,
                database_url: None,
            },
            client: ClientConfig::default(),
            environment: Environment::Development,
        }
    }
}

impl FromStr for Environment {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid TOYROBOT_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = DaemonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            other => Err(DaemonError::Config(format!(
                "Invalid TOYROBOT_STORE: {}. Expected: memory, postgres",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Postgres => write!(f, "postgres"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> DaemonResult<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.cors_origin, "http://localhost:3001");
        assert_eq!(config.store.kind, StoreKind::Memory);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.bind_addr(), "127.0.0.1:0");
        assert_eq!(config.environment, Environment::Test);
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.client.base_url, "http://localhost:3000");
        assert_eq!(config.client.timeout, Duration::from_millis(5000));
        assert_eq!(config.store.database_url, None);
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("TOYROBOT_ENV", "prod"),
            ("TOYROBOT_API_HOST", "127.0.0.1"),
            ("TOYROBOT_API_PORT", "8081"),
            ("TOYROBOT_CORS_ORIGIN", "https://robot.example"),
            ("TOYROBOT_STORE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/robot"),
            ("TOYROBOT_API_URL", "http://api:3000"),
            ("TOYROBOT_CLIENT_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.api.cors_origin, "https://robot.example");
        assert_eq!(config.store.kind, StoreKind::Postgres);
        assert_eq!(config.store.database_url.as_deref(), Some("postgres://localhost/robot"));
        assert_eq!(config.client.base_url, "http://api:3000");
        assert_eq!(config.client.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(from_vars(&[("TOYROBOT_ENV", "staging")]), Err(DaemonError::Config(_))));
        assert!(matches!(from_vars(&[("TOYROBOT_API_PORT", "http")]), Err(DaemonError::Config(_))));
        assert!(matches!(from_vars(&[("TOYROBOT_STORE", "redis")]), Err(DaemonError::Config(_))));
        assert!(matches!(
            from_vars(&[("TOYROBOT_CLIENT_TIMEOUT_MS", "0")]),
            Err(DaemonError::Config(_))
        ));
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let result = from_vars(&[("TOYROBOT_STORE", "postgres")]);
        assert!(matches!(result, Err(DaemonError::Config(msg)) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}

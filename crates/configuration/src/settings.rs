use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section and every field has a default, so the application starts
/// with no `config.toml` at all; the file (or `REPOSCOPE__*` environment
/// variables) only overrides the pieces it names.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Settings for the HTTP listener and route layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// The interface to bind (e.g. "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The version prefix all API routes are nested under (e.g. "/api/unstable").
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

/// Settings for the connection pool and query execution.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// How long a request may wait to check a connection out of the pool.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Per-query time budget; a query that exceeds it is abandoned and the
    /// request fails instead of holding the connection indefinitely.
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

// --- Default Implementations ---
// These keep the TOML file optional: an empty file (or none at all) yields
// a runnable configuration.

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_prefix() -> String {
    "/api/unstable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_statement_timeout_secs() -> u64 {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
        }
    }
}

impl Config {
    /// Checks cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()
    }
}

impl ServerSettings {
    /// The router nests every API route under `api_prefix`, so the prefix
    /// must be a real, non-root path segment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "server.api_prefix must start with '/': got {:?}",
                self.api_prefix
            )));
        }
        if self.api_prefix == "/" {
            return Err(ConfigError::ValidationError(
                "server.api_prefix must not be the bare root '/'".to_string(),
            ));
        }
        if self.api_prefix.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "server.api_prefix must not end with '/': got {:?}",
                self.api_prefix
            )));
        }
        Ok(())
    }

    /// The "host:port" string the TCP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.api_prefix, "/api/unstable");
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.database.statement_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn prefix_without_leading_slash_is_rejected() {
        let mut config = Config::default();
        config.server.api_prefix = "api/unstable".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bare_root_prefix_is_rejected() {
        let mut config = Config::default();
        config.server.api_prefix = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn trailing_slash_prefix_is_rejected() {
        let mut config = Config::default();
        config.server.api_prefix = "/api/unstable/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 9000",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: Config = builder.try_deserialize().unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.max_connections, 10);
    }
}

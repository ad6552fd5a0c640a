//! # Configuration
//!
//! Effective configuration is built in three layers:
//!
//! 1. Defaults (`#[serde(default = ...)]`)
//! 2. Optional JSON file (`--config`)
//! 3. `ISEKAI_*` environment variables
//!
//! Credentials have no usable default: an empty password is allowed only
//! for trust-authenticated local databases.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::observability::Severity;

/// Top level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Lowest severity written by the logger (default: "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// PostgreSQL connection and pool settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// Connections kept open while idle (default: 1)
    #[serde(default = "default_pool_min")]
    pub pool_min: u32,

    /// Upper bound on concurrent store operations (default: 5)
    #[serde(default = "default_pool_max")]
    pub pool_max: u32,

    /// How long a request waits for a pooled connection (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Server-side `statement_timeout` per connection (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub statement_timeout_ms: u64,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "isekai".to_string()
}

fn default_db_name() -> String {
    "isekaidb".to_string()
}

fn default_pool_min() -> u32 {
    1
}

fn default_pool_max() -> u32 {
    5
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: String::new(),
            name: default_db_name(),
            pool_min: default_pool_min(),
            pool_max: default_pool_max(),
            acquire_timeout_ms: default_timeout_ms(),
            statement_timeout_ms: default_timeout_ms(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("pool_min", &self.pool_min)
            .field("pool_max", &self.pool_max)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .finish()
    }
}

impl DatabaseConfig {
    /// Copy with the password blanked, safe to print
    pub fn redacted(&self) -> Self {
        Self {
            password: if self.password.is_empty() {
                String::new()
            } else {
                "<redacted>".to_string()
            },
            ..self.clone()
        }
    }
}

impl AppConfig {
    /// Load defaults, then the optional file, then the process environment
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` abstracts `std::env::var` so tests never touch the real
    /// process environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ISEKAI_HTTP_HOST") {
            self.http.host = v;
        }
        if let Some(v) = get("ISEKAI_HTTP_PORT") {
            self.http.port = parse_env("ISEKAI_HTTP_PORT", &v)?;
        }
        if let Some(v) = get("ISEKAI_HTTP_REQUEST_TIMEOUT_MS") {
            self.http.request_timeout_ms = parse_env("ISEKAI_HTTP_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("ISEKAI_HTTP_CORS_ORIGINS") {
            self.http.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("ISEKAI_DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = get("ISEKAI_DB_PORT") {
            self.database.port = parse_env("ISEKAI_DB_PORT", &v)?;
        }
        if let Some(v) = get("ISEKAI_DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("ISEKAI_DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = get("ISEKAI_DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = get("ISEKAI_DB_POOL_MIN") {
            self.database.pool_min = parse_env("ISEKAI_DB_POOL_MIN", &v)?;
        }
        if let Some(v) = get("ISEKAI_DB_POOL_MAX") {
            self.database.pool_max = parse_env("ISEKAI_DB_POOL_MAX", &v)?;
        }
        if let Some(v) = get("ISEKAI_DB_ACQUIRE_TIMEOUT_MS") {
            self.database.acquire_timeout_ms = parse_env("ISEKAI_DB_ACQUIRE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("ISEKAI_DB_STATEMENT_TIMEOUT_MS") {
            self.database.statement_timeout_ms =
                parse_env("ISEKAI_DB_STATEMENT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("ISEKAI_LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        let db = &self.database;
        if db.host.trim().is_empty() {
            return Err(ConfigError::Invalid("database.host must not be empty".into()));
        }
        if db.user.trim().is_empty() {
            return Err(ConfigError::Invalid("database.user must not be empty".into()));
        }
        if db.name.trim().is_empty() {
            return Err(ConfigError::Invalid("database.name must not be empty".into()));
        }
        if db.pool_max == 0 {
            return Err(ConfigError::Invalid("database.pool_max must be > 0".into()));
        }
        if db.pool_min > db.pool_max {
            return Err(ConfigError::Invalid(format!(
                "database.pool_min ({}) exceeds database.pool_max ({})",
                db.pool_min, db.pool_max
            )));
        }
        if db.acquire_timeout_ms == 0 || db.statement_timeout_ms == 0 {
            return Err(ConfigError::Invalid("database timeouts must be > 0".into()));
        }
        if self.http.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("http.request_timeout_ms must be > 0".into()));
        }
        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(ConfigError::Invalid)
    }

    /// Copy with secrets blanked, safe to print
    pub fn redacted(&self) -> Self {
        Self {
            database: self.database.redacted(),
            ..self.clone()
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

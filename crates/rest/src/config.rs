//! Server configuration for the TableData HTTP API.
//!
//! This module provides configuration types for the server, supporting
//! command line arguments, environment variables and programmatic construction.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TABLEDATA_SERVER_PORT` | 8080 | Server port |
//! | `TABLEDATA_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `TABLEDATA_LOG_LEVEL` | info | Log level |
//! | `TABLEDATA_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `TABLEDATA_ENABLE_CORS` | true | Enable CORS |
//! | `TABLEDATA_CORS_ORIGINS` | * | Allowed origins |
//! | `TABLEDATA_CORS_METHODS` | GET,POST,OPTIONS | Allowed methods |
//! | `TABLEDATA_CORS_HEADERS` | Content-Type,Accept,Authorization | Allowed headers |
//! | `TABLEDATA_STORAGE_BACKEND` | sqlite | Database backend (`sqlite` or `postgres`) |
//! | `TABLEDATA_DATABASE_URL` | (none) | SQLite path or PostgreSQL connection string |
//! | `TABLEDATA_TABLES_FILE` | (none) | JSON file with table definitions |
//! | `TABLEDATA_DEFAULT_PAGE_LENGTH` | 10 | Page length when a request omits `length` |
//! | `TABLEDATA_MAX_PAGE_LENGTH` | 1000 | Largest page a request may ask for |
//! | `TABLEDATA_ENFORCE_ORDERABLE` | true | Reject sorting on non-orderable columns |
//!
//! # Example
//!
//! ```rust
//! use tabledata_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     max_page_length: 500,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

/// Server configuration for the TableData HTTP API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "tabledata-server")]
#[command(about = "Server-side processing endpoint for DataTables grids")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "TABLEDATA_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "TABLEDATA_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TABLEDATA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in seconds.
    #[arg(long, env = "TABLEDATA_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "TABLEDATA_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "TABLEDATA_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "TABLEDATA_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "TABLEDATA_CORS_HEADERS",
        default_value = "Content-Type,Accept,Authorization"
    )]
    pub cors_headers: String,

    /// Database backend: `sqlite` or `postgres`.
    #[arg(long, env = "TABLEDATA_STORAGE_BACKEND", default_value = "sqlite")]
    pub storage_backend: String,

    /// Database location: a SQLite path (or `:memory:`) or a PostgreSQL URL.
    #[arg(long, env = "TABLEDATA_DATABASE_URL")]
    pub database_url: Option<String>,

    /// JSON file mapping table names to query definitions.
    #[arg(long, env = "TABLEDATA_TABLES_FILE")]
    pub tables_file: Option<PathBuf>,

    /// Page length used when a request omits `length`.
    #[arg(long, env = "TABLEDATA_DEFAULT_PAGE_LENGTH", default_value = "10")]
    pub default_page_length: u64,

    /// Largest page length a request may ask for; also caps `length=-1`.
    #[arg(long, env = "TABLEDATA_MAX_PAGE_LENGTH", default_value = "1000")]
    pub max_page_length: u64,

    /// Reject sort directives on columns sent with `orderable=false`.
    #[arg(long, env = "TABLEDATA_ENFORCE_ORDERABLE", default_value = "true")]
    pub enforce_orderable: bool,
}

/// Database backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendMode {
    /// Embedded SQLite database.
    Sqlite,
    /// PostgreSQL server.
    Postgres,
}

impl fmt::Display for StorageBackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendMode::Sqlite => write!(f, "sqlite"),
            StorageBackendMode::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for StorageBackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackendMode::Sqlite),
            "postgres" | "postgresql" => Ok(StorageBackendMode::Postgres),
            other => Err(format!(
                "unknown storage backend '{}' (expected 'sqlite' or 'postgres')",
                other
            )),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept,Authorization".to_string(),
            storage_backend: "sqlite".to_string(),
            database_url: None,
            tables_file: None,
            default_page_length: 10,
            max_page_length: 1000,
            enforce_orderable: true,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        // Try to parse from environment, falling back to defaults
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured storage backend.
    pub fn storage_backend_mode(&self) -> Result<StorageBackendMode, String> {
        self.storage_backend.parse()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.max_page_length == 0 {
            errors.push("Max page length cannot be 0".to_string());
        }

        if self.default_page_length > self.max_page_length {
            errors.push("Default page length cannot exceed max page length".to_string());
        }

        if let Err(e) = self.storage_backend_mode() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0 and disables features that might interfere
    /// with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            storage_backend: "sqlite".to_string(),
            database_url: Some(":memory:".to_string()),
            tables_file: None,
            default_page_length: 10,
            max_page_length: 100,
            enforce_orderable: true,
        }
    }
}

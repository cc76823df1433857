//! SQLite backend implementation.

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use crate::core::{QueryExecutor, SqlDialect, SqlStatement};
use crate::error::DataAccessError;
use crate::types::ResultSet;

use super::values;

const BACKEND_NAME: &str = "sqlite";

/// SQLite backend executing table-view queries.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    is_memory: bool,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool.
    ///
    /// Forced to 1 for in-memory databases, where every connection would
    /// otherwise open its own empty database.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for file databases.
    #[serde(default = "default_true")]
    pub enable_wal: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
        }
    }
}

impl SqliteBackend {
    /// Creates a new in-memory SQLite backend.
    pub fn in_memory() -> Result<Self, DataAccessError> {
        Self::with_config(":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataAccessError> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Creates a backend with custom configuration.
    ///
    /// The path `:memory:` opens an in-memory database.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> Result<Self, DataAccessError> {
        let is_memory = path.as_ref().to_string_lossy() == ":memory:";

        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };
        let manager = manager.with_init(move |conn| conn.busy_timeout(busy_timeout));

        let (max_size, min_idle) = if is_memory {
            (1, 1)
        } else {
            (config.max_connections, config.min_connections)
        };

        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(min_idle))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| DataAccessError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })?;

        let backend = Self {
            pool,
            config,
            is_memory,
        };

        backend.configure_connection()?;

        tracing::debug!(
            path = %path.as_ref().display(),
            is_memory,
            max_connections = max_size,
            "Opened SQLite backend"
        );

        Ok(backend)
    }

    /// Get a connection from the pool.
    pub(crate) fn get_connection(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, DataAccessError> {
        self.pool.get().map_err(|e| DataAccessError::ConnectionFailed {
            backend_name: BACKEND_NAME.to_string(),
            message: e.to_string(),
        })
    }

    /// Configure database-wide settings.
    fn configure_connection(&self) -> Result<(), DataAccessError> {
        if self.config.enable_wal && !self.is_memory {
            let conn = self.get_connection()?;
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
                .map_err(|e| DataAccessError::ConnectionFailed {
                    backend_name: BACKEND_NAME.to_string(),
                    message: format!("Failed to enable WAL mode: {}", e),
                })?;
        }
        Ok(())
    }

    /// Runs a batch of semicolon-separated statements, such as schema setup.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DataAccessError> {
        let conn = self.get_connection()?;
        conn.execute_batch(sql)
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    fn run_count(&self, statement: &SqlStatement) -> Result<u64, DataAccessError> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&statement.sql)
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?;

        let names = values::parameter_names(statement);
        let bound = bind(&names, statement);
        let count: i64 = stmt
            .query_row(bound.as_slice(), |row| row.get(0))
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?;

        u64::try_from(count).map_err(|_| DataAccessError::UnexpectedResult {
            backend_name: BACKEND_NAME.to_string(),
            message: format!("negative row count {}", count),
        })
    }

    fn run_fetch(&self, statement: &SqlStatement) -> Result<ResultSet, DataAccessError> {
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&statement.sql)
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let names = values::parameter_names(statement);
        let bound = bind(&names, statement);
        let mut rows = stmt
            .query(bound.as_slice())
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?;

        let mut data = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?
        {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                let cell = row
                    .get_ref(i)
                    .map_err(|e| DataAccessError::query_failed(BACKEND_NAME, e))?;
                cells.push(values::to_json(cell));
            }
            data.push(cells);
        }

        Ok(ResultSet::new(columns, data))
    }
}

/// Pairs `:name` keys with parameter values for rusqlite's named binding.
fn bind<'a>(names: &'a [String], statement: &'a SqlStatement) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .zip(statement.params.values())
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

#[async_trait]
impl QueryExecutor for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    async fn count(&self, statement: &SqlStatement) -> Result<u64, DataAccessError> {
        self.run_count(statement)
    }

    async fn fetch(&self, statement: &SqlStatement) -> Result<ResultSet, DataAccessError> {
        self.run_fetch(statement)
    }

    async fn health_check(&self) -> Result<(), DataAccessError> {
        let conn = self
            .get_connection()
            .map_err(|_| DataAccessError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: "Failed to get connection".to_string(),
            })?;

        conn.query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| DataAccessError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Health check failed: {}", e),
            })?;

        Ok(())
    }
}

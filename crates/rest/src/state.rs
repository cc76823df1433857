//! Application state for the TableData HTTP API.
//!
//! This module defines the shared state available to every request handler:
//! the query executor, the registered tables and the server configuration.

use std::sync::Arc;

use tabledata_persistence::ComposerOptions;
use tabledata_persistence::core::QueryExecutor;

use crate::config::ServerConfig;
use crate::registry::TableRegistry;

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `E` - The database backend (must implement [`QueryExecutor`])
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tabledata_persistence::backends::sqlite::SqliteBackend;
/// use tabledata_rest::{AppState, ServerConfig, TableRegistry};
///
/// let backend = SqliteBackend::in_memory()?;
/// let state = AppState::new(Arc::new(backend), TableRegistry::new(), ServerConfig::default());
/// assert_eq!(state.composer_options().max_page_length, Some(1000));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct AppState<E> {
    /// The database backend.
    executor: Arc<E>,

    /// Tables that may be queried.
    tables: Arc<TableRegistry>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since E is wrapped in Arc and doesn't need to be Clone
impl<E> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            tables: Arc::clone(&self.tables),
            config: Arc::clone(&self.config),
        }
    }
}

impl<E: QueryExecutor> AppState<E> {
    /// Creates a new AppState with the given executor, tables and configuration.
    pub fn new(executor: Arc<E>, tables: TableRegistry, config: ServerConfig) -> Self {
        Self {
            executor,
            tables: Arc::new(tables),
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the database backend.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Returns the registered tables.
    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the page length used when a request omits `length`.
    pub fn default_page_length(&self) -> u64 {
        self.config.default_page_length
    }

    /// Returns the composition limits derived from configuration.
    pub fn composer_options(&self) -> ComposerOptions {
        ComposerOptions {
            max_page_length: Some(self.config.max_page_length),
            enforce_orderable: self.config.enforce_orderable,
        }
    }
}

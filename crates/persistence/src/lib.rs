//! TableData Persistence Layer
//!
//! This crate turns server-side data-grid requests into parameterized SQL and
//! shapes the results into the envelope the grid expects. It is the engine
//! behind the `tabledata-rest` HTTP layer, but has no HTTP dependencies of its
//! own.
//!
//! # Features
//!
//! - **Query composition**: `SELECT`, `WHERE`, `ORDER BY`, `LIMIT`/`OFFSET`
//!   derived from a static descriptor plus per-request parameters
//! - **Free-text search**: case-insensitive match across every searchable
//!   column, each bound as its own named parameter
//! - **Counts**: unfiltered and filtered totals for the grid's pager
//! - **Multiple Backends**: SQLite and PostgreSQL behind one executor trait
//!
//! # Backend Features
//!
//! ```toml
//! [dependencies]
//! tabledata-persistence = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! - `sqlite` (default) - SQLite with in-memory and file modes
//! - `postgres` - PostgreSQL via tokio-postgres and deadpool
//!
//! # Architecture
//!
//! - [`types`] - Descriptors, request parameters, results
//! - [`query`] - Clause derivation and placeholder handling
//! - [`core`] - The composer and the executor trait
//! - [`error`] - Error types for all operations
//! - [`backends`] - Executor implementations
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use tabledata_persistence::backends::sqlite::SqliteBackend;
//! use tabledata_persistence::types::{ColumnSpec, QueryDescriptor, RequestDescriptor};
//! use tabledata_persistence::{ComposerOptions, QueryComposer};
//!
//! let backend = SqliteBackend::in_memory()?;
//! backend.execute_batch(
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
//!      INSERT INTO users (name) VALUES ('alice'), ('bob');",
//! )?;
//!
//! let descriptor = QueryDescriptor::new("FROM users")?;
//! let request = RequestDescriptor::new(vec![ColumnSpec::new("id"), ColumnSpec::new("name")])
//!     .with_search("ali")
//!     .with_draw(1);
//!
//! let composer = QueryComposer::new(&backend, &descriptor, &request, &ComposerOptions::default()).await?;
//! let envelope = composer.get().await?;
//!
//! assert_eq!(envelope.records_total, 2);
//! assert_eq!(envelope.records_filtered, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{TableError, TableResult};
pub use types::{QueryDescriptor, RequestDescriptor, ResultEnvelope};

// Re-export the composer and executor seam
pub use core::{QueryComposer, QueryExecutor, SqlDialect, SqlStatement};
pub use query::ComposerOptions;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Query composition and execution.
//!
//! - [`QueryExecutor`] - The capability a database backend provides
//! - [`QueryComposer`] - Composes, runs and shapes one table-view request
//! - [`SqlStatement`], [`SqlDialect`] - What the composer hands to an executor

pub mod composer;
pub mod executor;

pub use composer::QueryComposer;
pub use executor::{QueryExecutor, SqlDialect, SqlStatement};

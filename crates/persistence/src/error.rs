//! Error types for the persistence layer.
//!
//! This module defines all error types used while composing and executing
//! table-data queries, following a hierarchy that separates caller-contract
//! violations, per-request errors, and failures reported by the database.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all table-data operations.
///
/// Every stage of a composition returns this type, so a failure anywhere
/// aborts the whole request before any partial response is produced.
#[derive(Error, Debug)]
pub enum TableError {
    /// Required construction input missing or inconsistent
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The request references something it is not allowed to
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The database rejected or failed a query
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// Caller-contract violations.
///
/// These are raised before any query reaches the database.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The mandatory FROM fragment was not supplied.
    #[error("missing required FROM clause")]
    MissingFrom,

    /// A raw fragment does not start with the keyword it must start with.
    #[error("{clause} fragment must start with '{expected}': {fragment}")]
    InvalidFragment {
        clause: &'static str,
        expected: &'static str,
        fragment: String,
    },

    /// Neither a SELECT override nor any columns were given.
    #[error("no SELECT clause: pass the columns array or set a select override")]
    MissingSelect,

    /// A requested column is not a plain or dotted SQL identifier.
    #[error("invalid column name: '{name}'")]
    InvalidColumnName { name: String },

    /// Two columns (or a column and a static parameter) derived the same bound name.
    #[error("bound parameter ':{parameter}' derived from both '{first}' and '{second}'")]
    ParameterCollision {
        parameter: String,
        first: String,
        second: String,
    },

    /// The WHERE fragment references a placeholder with no bound value.
    #[error("placeholder ':{name}' has no bound parameter")]
    UnboundPlaceholder { name: String },

    /// A bound parameter is not referenced by the WHERE fragment.
    #[error("parameter '{name}' is not referenced by the WHERE clause")]
    UnusedParameter { name: String },

    /// The SELECT override does not produce a requested column.
    #[error("column '{column}' is not produced by the SELECT clause")]
    ColumnNotSelected { column: String },
}

/// Errors caused by the content of a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A sort directive points outside the requested column list.
    #[error("sort column index {index} out of range ({column_count} columns requested)")]
    ColumnOutOfRange { index: usize, column_count: usize },

    /// A sort directive targets a column flagged as not orderable.
    #[error("column '{column}' is not orderable")]
    NotOrderable { column: String },

    /// The sort direction is neither `asc` nor `desc`.
    #[error("invalid sort direction: '{value}'")]
    InvalidSortDirection { value: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// The database rejected or failed a statement.
    #[error("query execution failed in {backend_name}: {message}")]
    QueryFailed {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A statement succeeded but returned something unusable.
    #[error("unexpected result from {backend_name}: {message}")]
    UnexpectedResult {
        backend_name: String,
        message: String,
    },
}

impl DataAccessError {
    /// Wraps a driver error raised while running a statement.
    pub fn query_failed<E>(backend_name: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DataAccessError::QueryFailed {
            backend_name: backend_name.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for table-data operations.
pub type TableResult<T> = Result<T, TableError>;

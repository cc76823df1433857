//! Database execution abstraction.
//!
//! This module defines the [`QueryExecutor`] trait, the only capability the
//! composer needs from a database: run a counting statement, run a row
//! statement, and report which SQL dialect it speaks. Each backend implements
//! it on top of its own driver and connection pool.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::DataAccessError;
use crate::query::placeholders;
use crate::types::{ResultSet, SqlParam};

/// SQL dialect spoken by a backend.
///
/// The composer only needs to know how to spell a case-insensitive pattern
/// match; everything else it emits is portable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    /// SQLite, where `LIKE` is case-insensitive for ASCII.
    Sqlite,
    /// PostgreSQL, which has `ILIKE`.
    Postgres,
}

impl SqlDialect {
    /// Returns the case-insensitive pattern-match operator.
    pub fn like_operator(&self) -> &'static str {
        match self {
            SqlDialect::Sqlite => "LIKE",
            SqlDialect::Postgres => "ILIKE",
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlDialect::Sqlite => write!(f, "sqlite"),
            SqlDialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// A complete SQL statement with its named parameters.
///
/// Placeholders are written `:name`; `params` holds exactly the names the
/// statement references.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// The SQL text.
    pub sql: String,
    /// Named parameter values, keyed without the leading colon.
    pub params: BTreeMap<String, SqlParam>,
}

impl SqlStatement {
    /// Creates a statement from SQL and parameters.
    pub fn new(sql: impl Into<String>, params: BTreeMap<String, SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Returns the SQL with parameter values inlined.
    ///
    /// For log output only; never execute the result.
    pub fn debug_sql(&self) -> String {
        placeholders::inline(&self.sql, &self.params)
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Executes composed statements against a database.
///
/// Implementations own connection management. A single composition calls
/// `count` once or twice and `fetch` once; the calls are independent and no
/// transaction spans them.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Returns a short name for the backend, used in logs and errors.
    fn backend_name(&self) -> &'static str;

    /// Returns the dialect the backend speaks.
    fn dialect(&self) -> SqlDialect;

    /// Runs a statement that yields a single integer in its first row and column.
    async fn count(&self, statement: &SqlStatement) -> Result<u64, DataAccessError>;

    /// Runs a statement and materializes every row.
    async fn fetch(&self, statement: &SqlStatement) -> Result<ResultSet, DataAccessError>;

    /// Checks that the backend can serve queries.
    async fn health_check(&self) -> Result<(), DataAccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_operator() {
        assert_eq!(SqlDialect::Sqlite.like_operator(), "LIKE");
        assert_eq!(SqlDialect::Postgres.like_operator(), "ILIKE");
    }

    #[test]
    fn test_statement_debug_sql() {
        let mut params = BTreeMap::new();
        params.insert("search_name".to_string(), SqlParam::string("%bo%"));
        let statement = SqlStatement::new("SELECT name FROM t WHERE name LIKE :search_name", params);
        assert_eq!(
            statement.debug_sql(),
            "SELECT name FROM t WHERE name LIKE '%bo%'"
        );
    }
}

//! SQL query builder for table views.
//!
//! Derives the `SELECT`, `WHERE`, `ORDER BY` and `LIMIT`/`OFFSET` clauses of a
//! table view from a [`QueryDescriptor`] and a [`RequestDescriptor`]. Static
//! fragments come from the descriptor verbatim; request input only reaches the
//! SQL as bound parameters, validated identifiers or integers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{SqlDialect, SqlStatement};
use crate::error::{ConfigurationError, RequestError, TableResult};
use crate::types::{QueryDescriptor, RequestDescriptor, SqlParam};

use super::projection::Projection;

/// Plain or dotted SQL identifier: `name`, `u.name`, `schema.table.col`.
static COLUMN_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("column name pattern is valid")
});

/// Prefix of every bound parameter generated for the free-text search.
pub const SEARCH_PARAM_PREFIX: &str = "search_";

/// Knobs that change composition behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerOptions {
    /// Upper bound for the page length. `None` leaves it unbounded.
    pub max_page_length: Option<u64>,
    /// Reject sort directives on columns flagged as not orderable.
    pub enforce_orderable: bool,
}

impl Default for ComposerOptions {
    fn default() -> Self {
        Self {
            max_page_length: None,
            enforce_orderable: true,
        }
    }
}

/// Derives the bound-parameter name used to search `column`.
///
/// Characters that cannot appear in a parameter identifier (such as the `.` of
/// a qualified name) become `_`.
pub fn search_param_name(column: &str) -> String {
    let sanitized: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}{}", SEARCH_PARAM_PREFIX, sanitized)
}

/// A fully derived table-view query.
///
/// Rebuilt for every request. The merged `params` hold exactly the
/// placeholders referenced by `where_clause`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    select: String,
    from: String,
    static_where: Option<String>,
    static_params: BTreeMap<String, SqlParam>,
    where_clause: Option<String>,
    params: BTreeMap<String, SqlParam>,
    order_by: Option<String>,
    paging: String,
    filtered: bool,
    projection: Projection,
}

impl ComposedQuery {
    /// Returns the `SELECT` clause.
    pub fn select(&self) -> &str {
        &self.select
    }

    /// Returns the `FROM` clause.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Returns the composed `WHERE` clause, if any.
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Returns the `ORDER BY` clause, if any.
    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    /// Returns the `LIMIT`/`OFFSET` clause.
    pub fn paging(&self) -> &str {
        &self.paging
    }

    /// Returns the merged parameter mapping (static and search).
    pub fn params(&self) -> &BTreeMap<String, SqlParam> {
        &self.params
    }

    /// Returns true if the free-text filter is applied.
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    /// Returns how result rows map onto requested columns.
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// The page query: select, from, where, order by, paging.
    pub fn select_statement(&self) -> SqlStatement {
        let sql = join_clauses([
            Some(self.select.as_str()),
            Some(self.from.as_str()),
            self.where_clause.as_deref(),
            self.order_by.as_deref(),
            Some(self.paging.as_str()),
        ]);
        SqlStatement::new(sql, self.params.clone())
    }

    /// Counts rows matching the composed where clause.
    pub fn filtered_count_statement(&self) -> SqlStatement {
        let sql = join_clauses([
            Some("SELECT COUNT(*)"),
            Some(self.from.as_str()),
            self.where_clause.as_deref(),
        ]);
        SqlStatement::new(sql, self.params.clone())
    }

    /// Counts rows matching only the static where clause.
    pub fn total_count_statement(&self) -> SqlStatement {
        let sql = join_clauses([
            Some("SELECT COUNT(*)"),
            Some(self.from.as_str()),
            self.static_where.as_deref(),
        ]);
        SqlStatement::new(sql, self.static_params.clone())
    }

    /// The page query with parameters inlined, for logging.
    pub fn debug_sql(&self) -> String {
        self.select_statement().debug_sql()
    }
}

fn join_clauses<'a>(clauses: impl IntoIterator<Item = Option<&'a str>>) -> String {
    clauses
        .into_iter()
        .flatten()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds [`ComposedQuery`] values for one SQL dialect.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    dialect: SqlDialect,
    options: ComposerOptions,
}

impl QueryBuilder {
    /// Creates a builder with default options.
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            options: ComposerOptions::default(),
        }
    }

    /// Replaces the composition options.
    pub fn with_options(mut self, options: ComposerOptions) -> Self {
        self.options = options;
        self
    }

    /// Derives every clause.
    ///
    /// Fails before touching the database when the descriptor and the request
    /// cannot produce a valid query.
    pub fn build(
        &self,
        descriptor: &QueryDescriptor,
        request: &RequestDescriptor,
    ) -> TableResult<ComposedQuery> {
        self.validate_columns(request)?;

        let select = self.build_select(descriptor, request)?;
        let (where_clause, params, filtered) = self.build_where(descriptor, request)?;
        let order_by = self.build_order_by(request)?;
        let paging = self.build_paging(request);

        let projection = if descriptor.select_override().is_some() {
            Projection::ByName
        } else {
            Projection::Positional
        };

        Ok(ComposedQuery {
            select,
            from: descriptor.from_clause().to_string(),
            static_where: descriptor.where_clause().map(str::to_string),
            static_params: descriptor.params().clone(),
            where_clause,
            params,
            order_by,
            paging,
            filtered,
            projection,
        })
    }

    /// Rejects column names that are not SQL identifiers.
    pub fn validate_columns(&self, request: &RequestDescriptor) -> Result<(), ConfigurationError> {
        match request
            .columns()
            .iter()
            .find(|c| !COLUMN_NAME.is_match(&c.name))
        {
            Some(column) => Err(ConfigurationError::InvalidColumnName {
                name: column.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Derives the `SELECT` clause.
    pub fn build_select(
        &self,
        descriptor: &QueryDescriptor,
        request: &RequestDescriptor,
    ) -> Result<String, ConfigurationError> {
        if let Some(select) = descriptor.select_override() {
            return Ok(select.to_string());
        }
        if request.columns().is_empty() {
            return Err(ConfigurationError::MissingSelect);
        }
        Ok(format!("SELECT {}", request.column_names().join(", ")))
    }

    /// Derives the `WHERE` clause and the merged parameters.
    ///
    /// Returns the clause, the parameters it binds, and whether the free-text
    /// filter was applied. A search term with no searchable columns is ignored.
    pub fn build_where(
        &self,
        descriptor: &QueryDescriptor,
        request: &RequestDescriptor,
    ) -> Result<(Option<String>, BTreeMap<String, SqlParam>, bool), ConfigurationError> {
        let static_where = descriptor.where_clause().map(str::to_string);
        let mut params = descriptor.params().clone();

        let term = match request.search_term() {
            Some(term) => term,
            None => return Ok((static_where, params, false)),
        };
        let searchable = request.searchable_columns();
        if searchable.is_empty() {
            return Ok((static_where, params, false));
        }

        let pattern = format!("%{}%", term);
        let mut owners: BTreeMap<String, &str> = BTreeMap::new();
        let mut predicates = Vec::with_capacity(searchable.len());

        for column in searchable {
            let name = search_param_name(column);
            if let Some(first) = owners.get(&name) {
                return Err(ConfigurationError::ParameterCollision {
                    parameter: name,
                    first: first.to_string(),
                    second: column.to_string(),
                });
            }
            if params.contains_key(&name) {
                return Err(ConfigurationError::ParameterCollision {
                    parameter: name.clone(),
                    first: format!(":{}", name),
                    second: column.to_string(),
                });
            }

            predicates.push(format!(
                "{} {} :{}",
                column,
                self.dialect.like_operator(),
                name
            ));
            owners.insert(name, column);
        }
        for name in owners.into_keys() {
            params.insert(name, SqlParam::string(pattern.clone()));
        }

        let chain = predicates.join(" OR ");
        let where_clause = match static_where {
            Some(static_where) => format!("{} AND ({})", static_where, chain),
            None => format!("WHERE {}", chain),
        };

        Ok((Some(where_clause), params, true))
    }

    /// Derives the `ORDER BY` clause.
    ///
    /// `None` when there are no directives; rows then come back in whatever
    /// order the database picks.
    pub fn build_order_by(&self, request: &RequestDescriptor) -> Result<Option<String>, RequestError> {
        if request.order().is_empty() {
            return Ok(None);
        }

        let columns = request.columns();
        let mut fields = Vec::with_capacity(request.order().len());
        for directive in request.order() {
            let column = columns
                .get(directive.column)
                .ok_or(RequestError::ColumnOutOfRange {
                    index: directive.column,
                    column_count: columns.len(),
                })?;
            if self.options.enforce_orderable && !column.orderable {
                return Err(RequestError::NotOrderable {
                    column: column.name.clone(),
                });
            }
            fields.push(format!("{} {}", column.name, directive.direction.as_sql()));
        }

        Ok(Some(format!("ORDER BY {}", fields.join(","))))
    }

    /// Derives the `LIMIT`/`OFFSET` clause.
    ///
    /// The configured ceiling clamps the page length and replaces "every row".
    pub fn build_paging(&self, request: &RequestDescriptor) -> String {
        let length = match (request.length(), self.options.max_page_length) {
            (Some(length), Some(max)) => Some(length.min(max)),
            (None, Some(max)) => Some(max),
            (length, None) => length,
        };

        match length {
            Some(length) => format!("LIMIT {} OFFSET {}", length, request.start()),
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
            None => match self.dialect {
                SqlDialect::Sqlite => format!("LIMIT -1 OFFSET {}", request.start()),
                SqlDialect::Postgres => format!("LIMIT ALL OFFSET {}", request.start()),
            },
        }
    }
}

//! The table-view query composer.
//!
//! [`QueryComposer`] ties a [`QueryDescriptor`], a [`RequestDescriptor`] and a
//! [`QueryExecutor`] together: it derives the query, counts rows, fetches the
//! page and shapes the response envelope.

use tracing::{debug, trace};

use crate::core::QueryExecutor;
use crate::error::{TableError, TableResult};
use crate::query::{ComposedQuery, ComposerOptions, QueryBuilder};
use crate::types::{QueryDescriptor, RequestDescriptor, ResultEnvelope};

/// Composes and runs one table-view request.
///
/// Construction derives every clause and runs the unfiltered count, so a
/// composer that exists always has a valid query and a total. Nothing is
/// cached across composers.
///
/// # Example
///
/// ```ignore
/// let composer = QueryComposer::new(&backend, &descriptor, &request, &options).await?;
/// let envelope = composer.get().await?;
/// ```
pub struct QueryComposer<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    request: &'a RequestDescriptor,
    query: ComposedQuery,
    records_total: u64,
}

impl<'a, E: QueryExecutor + ?Sized> QueryComposer<'a, E> {
    /// Builds the query and counts the unfiltered rows.
    ///
    /// Configuration and request errors surface here, before any statement
    /// reaches the database.
    pub async fn new(
        executor: &'a E,
        descriptor: &QueryDescriptor,
        request: &'a RequestDescriptor,
        options: &ComposerOptions,
    ) -> TableResult<Self> {
        let query = QueryBuilder::new(executor.dialect())
            .with_options(*options)
            .build(descriptor, request)?;

        let total = query.total_count_statement();
        debug!(
            backend = executor.backend_name(),
            sql = %total.sql,
            "Counting unfiltered rows"
        );
        let records_total = executor.count(&total).await?;

        Ok(Self {
            executor,
            request,
            query,
            records_total,
        })
    }

    /// Returns the composed query.
    pub fn query(&self) -> &ComposedQuery {
        &self.query
    }

    /// Returns the unfiltered row count computed at construction.
    pub fn records_total(&self) -> u64 {
        self.records_total
    }

    /// Returns the row count after filtering.
    ///
    /// Equal to [`records_total`](Self::records_total) without running a
    /// statement when no search is active.
    pub async fn records_filtered(&self) -> TableResult<u64> {
        if !self.query.is_filtered() {
            return Ok(self.records_total);
        }

        let statement = self.query.filtered_count_statement();
        debug!(
            backend = self.executor.backend_name(),
            sql = %statement.sql,
            params = statement.params.len(),
            "Counting filtered rows"
        );
        Ok(self.executor.count(&statement).await?)
    }

    /// Runs the page query and returns rows in requested column order.
    pub async fn search(&self) -> TableResult<Vec<Vec<serde_json::Value>>> {
        let statement = self.query.select_statement();
        debug!(
            backend = self.executor.backend_name(),
            sql = %statement.sql,
            params = statement.params.len(),
            "Fetching page"
        );
        trace!(sql = %statement.debug_sql(), "Page query with parameters");

        let result = self.executor.fetch(&statement).await?;
        let requested = self.request.column_names();
        self.query
            .projection()
            .apply(&requested, result)
            .map_err(TableError::from)
    }

    /// Runs the filtered count and the page query and assembles the envelope.
    pub async fn get(&self) -> TableResult<ResultEnvelope> {
        let records_filtered = self.records_filtered().await?;
        let data = self.search().await?;

        debug!(
            draw = self.request.draw(),
            records_total = self.records_total,
            records_filtered,
            rows = data.len(),
            "Composed table view"
        );

        Ok(ResultEnvelope {
            draw: self.request.draw(),
            records_total: self.records_total,
            records_filtered,
            data,
        })
    }
}

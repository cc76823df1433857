//! Table data handlers.
//!
//! Serves the DataTables server-side protocol for registered tables.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tabledata_persistence::{QueryComposer, QueryExecutor};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::DataTablesParams;
use crate::state::AppState;

/// Handler for table data requests.
///
/// Accepts the grid parameters from the query string (`GET`), a form body or
/// a JSON body (`POST`), composes the query for the named table and returns
/// one page of rows.
///
/// # HTTP Request
///
/// `GET /tables/{table}?draw=1&start=0&length=10&columns[0][data]=id...`
///
/// `POST /tables/{table}`
///
/// # Response
///
/// ```json
/// {"draw": 1, "recordsTotal": 57, "recordsFiltered": 14, "data": [[1, "alice"]]}
/// ```
pub async fn table_data_handler<E>(
    State(state): State<AppState<E>>,
    Path(table): Path<String>,
    params: DataTablesParams,
) -> RestResult<Response>
where
    E: QueryExecutor + 'static,
{
    let descriptor = state
        .tables()
        .get(&table)
        .ok_or_else(|| RestError::NotFound {
            table: table.clone(),
        })?;

    let request = params.into_request(state.default_page_length())?;
    debug!(
        table = %table,
        draw = request.draw(),
        columns = request.columns().len(),
        start = request.start(),
        length = ?request.length(),
        "Processing table data request"
    );

    let options = state.composer_options();
    let composer = QueryComposer::new(state.executor(), descriptor, &request, &options).await?;
    let envelope = composer.get().await?;

    Ok((StatusCode::OK, Json(envelope)).into_response())
}

/// Handler listing the registered table names.
///
/// # HTTP Request
///
/// `GET /tables`
pub async fn list_tables_handler<E>(State(state): State<AppState<E>>) -> RestResult<Response>
where
    E: QueryExecutor + 'static,
{
    let body = serde_json::json!({ "tables": state.tables().names() });
    Ok((StatusCode::OK, Json(body)).into_response())
}

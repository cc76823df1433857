//! Table route configuration.

use axum::{Router, routing::get};
use tabledata_persistence::QueryExecutor;

use crate::handlers;
use crate::state::AppState;

/// Creates all TableData API routes.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `GET /tables` - Registered table names
/// - `GET /tables/{table}` - Table data, parameters in the query string
/// - `POST /tables/{table}` - Table data, parameters as a form or JSON body
pub fn create_routes<E>(state: AppState<E>) -> Router
where
    E: QueryExecutor + 'static,
{
    Router::new()
        .route("/health", get(handlers::health_handler::<E>))
        .route("/tables", get(handlers::list_tables_handler::<E>))
        .route(
            "/tables/{table}",
            get(handlers::table_data_handler::<E>).post(handlers::table_data_handler::<E>),
        )
        .with_state(state)
}

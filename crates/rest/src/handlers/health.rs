//! Health check endpoint handler.
//!
//! Provides a health check endpoint for monitoring and load balancers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tabledata_persistence::core::QueryExecutor;
use tracing::{debug, warn};

use crate::error::{RestError, RestResult};
use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Runs the backend's health check, so a database that stopped answering
/// turns the endpoint unhealthy.
///
/// # HTTP Request
///
/// `GET /health`
///
/// # Response
///
/// - `200 OK` - Server and database are healthy
/// - `503 Service Unavailable` - The database cannot serve queries
pub async fn health_handler<E>(State(state): State<AppState<E>>) -> RestResult<Response>
where
    E: QueryExecutor + 'static,
{
    debug!("Processing health check request");

    let backend_name = state.executor().backend_name();

    if let Err(e) = state.executor().health_check().await {
        warn!(backend = backend_name, error = %e, "health check failed");
        return Err(RestError::ServiceUnavailable {
            message: format!("{} backend is unavailable", backend_name),
        });
    }

    let health_response = serde_json::json!({
        "status": "healthy",
        "backend": backend_name,
        "tables": state.tables().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    Ok((StatusCode::OK, Json(health_response)).into_response())
}

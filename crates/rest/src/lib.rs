//! # tabledata-rest - DataTables server-side processing over HTTP
//!
//! This crate exposes registered table queries through the
//! [DataTables server-side processing](https://datatables.net/manual/server-side)
//! protocol. Each request is turned into a [`RequestDescriptor`], composed into
//! parameterized SQL by [`tabledata_persistence::QueryComposer`] and answered
//! with `{draw, recordsTotal, recordsFiltered, data}`.
//!
//! [`RequestDescriptor`]: tabledata_persistence::RequestDescriptor
//!
//! ## Backend Support
//!
//! Backends are selected through feature flags:
//!
//! - `sqlite` - SQLite backend (default)
//! - `postgres` - PostgreSQL backend
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabledata_persistence::backends::sqlite::SqliteBackend;
//! use tabledata_rest::{ServerConfig, TableRegistry, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::open("app.db")?;
//!     let tables = TableRegistry::from_file("tables.json")?;
//!
//!     let app = create_app_with_config(backend, tables, ServerConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Method | URL | Description |
//! |--------|-----|-------------|
//! | GET | `/tables/{table}?draw=1&columns[0][data]=id...` | One page of a table |
//! | POST | `/tables/{table}` (form or JSON body) | One page of a table |
//! | GET | `/tables` | Registered table names |
//! | GET | `/health` | Backend health check |
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": "<message>"}`:
//!
//! | HTTP Status | Description |
//! |-------------|-------------|
//! | 400 | Malformed parameters, bad column names, invalid sort requests |
//! | 404 | Unknown table |
//! | 500 | Invalid table definition or database failure |
//! | 503 | Health check failed |
//!
//! ## Architecture
//!
//! - [`error`] - Error types and their HTTP mapping
//! - [`config`] - Server configuration
//! - [`registry`] - Named table definitions
//! - [`state`] - Application state (executor, tables, configuration)
//! - [`extractors`] - DataTables request parsing
//! - [`handlers`] - HTTP request handlers
//! - [`routing`] - Route configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod registry;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::{ServerConfig, StorageBackendMode};
pub use error::{RestError, RestResult};
pub use registry::{RegistryError, TableRegistry};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tabledata_persistence::QueryExecutor;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
pub fn create_app<E>(executor: E, tables: TableRegistry) -> Router
where
    E: QueryExecutor + 'static,
{
    create_app_with_config(executor, tables, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `executor` - The database backend
/// * `tables` - Tables the API may serve
/// * `config` - Server configuration
pub fn create_app_with_config<E>(executor: E, tables: TableRegistry, config: ServerConfig) -> Router
where
    E: QueryExecutor + 'static,
{
    info!(
        backend = executor.backend_name(),
        tables = tables.len(),
        "Creating TableData API server"
    );

    let state = AppState::new(Arc::new(executor), tables, config.clone());

    let router = routing::table_routes::create_routes(state);

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer from configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tabledata_rest={level},tabledata_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

//! TableData server
//!
//! Serves registered SQL tables to DataTables grids using server-side processing.

use clap::Parser;
use tabledata_rest::{
    ServerConfig, StorageBackendMode, TableRegistry, create_app_with_config, init_logging,
};
use tracing::{info, warn};

#[cfg(feature = "sqlite")]
use tabledata_persistence::backends::sqlite::SqliteBackend;

/// Creates a SQLite backend from the server configuration.
#[cfg(feature = "sqlite")]
fn create_sqlite_backend(config: &ServerConfig) -> anyhow::Result<SqliteBackend> {
    let db_path = config.database_url.as_deref().unwrap_or("tabledata.db");
    info!(database = %db_path, "Initializing SQLite backend");

    let backend = if db_path == ":memory:" {
        SqliteBackend::in_memory()?
    } else {
        SqliteBackend::open(db_path)?
    };

    Ok(backend)
}

/// Loads the table definitions named by the configuration.
fn load_tables(config: &ServerConfig) -> anyhow::Result<TableRegistry> {
    let Some(path) = config.tables_file.as_ref() else {
        warn!("No tables file configured; every table request will return 404");
        return Ok(TableRegistry::new());
    };

    let tables = TableRegistry::from_file(path)?;
    info!(
        path = %path.display(),
        tables = ?tables.names(),
        "Loaded table definitions"
    );
    Ok(tables)
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend_mode = config
        .storage_backend_mode()
        .map_err(|e| anyhow::anyhow!("Invalid storage backend configuration: {}", e))?;

    // Fail before binding if any definition is broken
    let tables = load_tables(&config)?;

    info!(
        port = config.port,
        host = %config.host,
        storage_backend = %backend_mode,
        max_page_length = config.max_page_length,
        "Starting TableData server"
    );

    match backend_mode {
        StorageBackendMode::Sqlite => {
            start_sqlite(config, tables).await?;
        }
        StorageBackendMode::Postgres => {
            start_postgres(config, tables).await?;
        }
    }

    Ok(())
}

/// Starts the server with the SQLite backend.
#[cfg(feature = "sqlite")]
async fn start_sqlite(config: ServerConfig, tables: TableRegistry) -> anyhow::Result<()> {
    let backend = create_sqlite_backend(&config)?;
    let app = create_app_with_config(backend, tables, config.clone());
    serve(app, &config).await
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
async fn start_sqlite(_config: ServerConfig, _tables: TableRegistry) -> anyhow::Result<()> {
    anyhow::bail!(
        "The sqlite backend requires the 'sqlite' feature. \
         Build with: cargo build -p tabledata-server --features sqlite"
    )
}

/// Starts the server with the PostgreSQL backend.
#[cfg(feature = "postgres")]
async fn start_postgres(config: ServerConfig, tables: TableRegistry) -> anyhow::Result<()> {
    use tabledata_persistence::backends::postgres::PostgresBackend;

    let backend = match config.database_url.as_deref() {
        Some(url) if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
            info!("Initializing PostgreSQL backend from connection string");
            PostgresBackend::from_connection_string(url).await?
        }
        _ => {
            info!("Initializing PostgreSQL backend from environment variables");
            PostgresBackend::from_env().await?
        }
    };

    let app = create_app_with_config(backend, tables, config.clone());
    serve(app, &config).await
}

/// Fallback when postgres feature is not enabled.
#[cfg(not(feature = "postgres"))]
async fn start_postgres(_config: ServerConfig, _tables: TableRegistry) -> anyhow::Result<()> {
    anyhow::bail!(
        "The postgres backend requires the 'postgres' feature. \
         Build with: cargo build -p tabledata-server --features postgres"
    )
}

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("At least one database backend feature must be enabled");

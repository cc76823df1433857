//! HTTP request handlers.
//!
//! - [`table_data_handler`] - One page of a registered table (`GET`/`POST /tables/{table}`)
//! - [`list_tables_handler`] - Registered table names (`GET /tables`)
//! - [`health_handler`] - Backend health (`GET /health`)

pub mod health;
pub mod tables;

pub use health::health_handler;
pub use tables::{list_tables_handler, table_data_handler};

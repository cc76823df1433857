//! Route configuration for the TableData API.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers.

pub mod table_routes;

pub use table_routes::create_routes;

//! Custom Axum extractors.
//!
//! - [`DataTablesParams`] - Grid state from a query string, form or JSON body

pub mod datatables;

pub use datatables::DataTablesParams;

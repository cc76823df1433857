//! Core types for the persistence layer.
//!
//! This module provides the values that flow through a composition:
//!
//! - [`QueryDescriptor`], [`SqlParam`] - The trusted static query definition
//! - [`RequestDescriptor`], [`ColumnSpec`], [`SortDirective`] - What the grid asked for
//! - [`ResultSet`], [`ResultEnvelope`] - Backend rows and the response body
//!
//! # Examples
//!
//! ```
//! use tabledata_persistence::types::{ColumnSpec, QueryDescriptor, RequestDescriptor};
//!
//! let descriptor = QueryDescriptor::new("FROM users")?;
//! let request = RequestDescriptor::new(vec![
//!     ColumnSpec::new("id").searchable(false),
//!     ColumnSpec::new("name"),
//! ])
//! .with_search("ali");
//!
//! assert_eq!(descriptor.from_clause(), "FROM users");
//! assert_eq!(request.searchable_columns(), vec!["name"]);
//! # Ok::<(), tabledata_persistence::error::ConfigurationError>(())
//! ```

mod descriptor;
mod request;
mod result;

pub use descriptor::{QueryDescriptor, RawQueryDescriptor, SqlParam};
pub use request::{
    ColumnSpec, DEFAULT_PAGE_LENGTH, RequestDescriptor, SortDirection, SortDirective,
};
pub use result::{ResultEnvelope, ResultSet};

//! Query composition.
//!
//! - [`builder`] - Derives every clause of a table-view query
//! - [`placeholders`] - Finds `:name` placeholders in SQL text
//! - [`projection`] - Maps result rows back onto requested columns

pub mod builder;
pub mod placeholders;
pub mod projection;

pub use builder::{ComposedQuery, ComposerOptions, QueryBuilder, SEARCH_PARAM_PREFIX, search_param_name};
pub use projection::Projection;

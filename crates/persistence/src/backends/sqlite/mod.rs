//! SQLite backend implementation.
//!
//! Supports in-memory databases (handy for tests and demos) and file-based
//! databases. Named `:name` placeholders are bound natively, and `LIKE` is
//! already case-insensitive for ASCII text.
//!
//! # Example
//!
//! ```no_run
//! use tabledata_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("./data/app.db")?;
//! backend.execute_batch("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Value mapping
//!
//! | SQLite | JSON |
//! |--------|------|
//! | NULL | `null` |
//! | INTEGER | number |
//! | REAL | number (`null` for NaN) |
//! | TEXT | string |
//! | BLOB | base64 string |

mod backend;
mod values;

pub use backend::{SqliteBackend, SqliteBackendConfig};

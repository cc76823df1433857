//! Named table definitions served by the API.
//!
//! Each table name maps to a [`QueryDescriptor`]. Definitions come from
//! trusted configuration, either a JSON file loaded at startup or code:
//!
//! ```json
//! {
//!   "users": {
//!     "from": "FROM users u JOIN roles r ON r.user_id = u.id",
//!     "where": "WHERE u.active = :active",
//!     "params": { "active": 1 }
//!   },
//!   "activity": { "from": "FROM cc.user", "select": "SELECT username, last_activity" }
//! }
//! ```
//!
//! Every definition is validated while loading, so a broken file stops the
//! server before it accepts requests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tabledata_persistence::types::QueryDescriptor;
use thiserror::Error;

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("table name pattern is valid")
});

/// Errors raised while building a [`TableRegistry`].
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The definitions file could not be read.
    #[error("failed to read table definitions from {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The definitions are not valid JSON or a definition is invalid.
    #[error("invalid table definitions: {0}")]
    Parse(#[from] serde_json::Error),

    /// A table name cannot be used as a URL path segment.
    #[error("invalid table name '{name}': use letters, digits, '_' or '-'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The same table name was registered twice.
    #[error("table '{name}' is already registered")]
    Duplicate {
        /// The duplicated name.
        name: String,
    },
}

/// Table definitions keyed by the name used in `/tables/{table}`.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: BTreeMap<String, QueryDescriptor>,
}

impl TableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        descriptor: QueryDescriptor,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if !TABLE_NAME.is_match(&name) {
            return Err(RegistryError::InvalidName { name });
        }
        if self.tables.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.tables.insert(name, descriptor);
        Ok(())
    }

    /// Builder-style variant of [`TableRegistry::register`].
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        descriptor: QueryDescriptor,
    ) -> Result<Self, RegistryError> {
        self.register(name, descriptor)?;
        Ok(self)
    }

    /// Parses a JSON object of table definitions.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let definitions: BTreeMap<String, QueryDescriptor> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (name, descriptor) in definitions {
            registry.register(name, descriptor)?;
        }
        Ok(registry)
    }

    /// Loads table definitions from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Returns the descriptor registered under `name`.
    pub fn get(&self, name: &str) -> Option<&QueryDescriptor> {
        self.tables.get(name)
    }

    /// Returns the registered table names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

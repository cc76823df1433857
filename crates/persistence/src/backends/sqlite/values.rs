//! Conversions between SQLite values and the crate's value types.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use serde_json::Value;

use crate::core::SqlStatement;
use crate::types::SqlParam;

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Null => ToSqlOutput::from(rusqlite::types::Null),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
            SqlParam::Float(f) => ToSqlOutput::from(*f),
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// Returns `:name` keys in the statement's parameter order.
pub(crate) fn parameter_names(statement: &SqlStatement) -> Vec<String> {
    statement
        .params
        .keys()
        .map(|name| format!(":{}", name))
        .collect()
}

/// Converts a SQLite cell to JSON. Blobs become base64 strings.
pub(crate) fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(STANDARD.encode(bytes)),
    }
}

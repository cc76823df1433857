//! Mapping result rows onto requested columns.

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::types::ResultSet;

/// How result columns line up with the requested columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The select list was derived from the requested columns, so result
    /// column `i` is requested column `i`.
    Positional,
    /// A select override was used; each requested column is looked up by name.
    ByName,
}

impl Projection {
    /// Reshapes `result` into rows with one cell per requested column.
    pub fn apply(
        &self,
        requested: &[&str],
        result: ResultSet,
    ) -> Result<Vec<Vec<Value>>, ConfigurationError> {
        match self {
            Projection::Positional => {
                if let Some(missing) = requested.get(result.columns.len()) {
                    return Err(ConfigurationError::ColumnNotSelected {
                        column: missing.to_string(),
                    });
                }
                Ok(result.rows)
            }
            Projection::ByName => {
                let indices = requested
                    .iter()
                    .map(|name| resolve(&result.columns, name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(result
                    .rows
                    .into_iter()
                    .map(|row| {
                        indices
                            .iter()
                            .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                            .collect()
                    })
                    .collect())
            }
        }
    }
}

/// Finds the result column for a requested name.
///
/// An exact match wins; otherwise the unqualified part of a dotted name
/// (`u.name` -> `name`) is tried, since databases report bare column names.
fn resolve(columns: &[String], requested: &str) -> Result<usize, ConfigurationError> {
    if let Some(i) = columns.iter().position(|c| c == requested) {
        return Ok(i);
    }
    let unqualified = requested.rsplit('.').next().unwrap_or(requested);
    columns
        .iter()
        .position(|c| c == unqualified)
        .ok_or_else(|| ConfigurationError::ColumnNotSelected {
            column: requested.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result() -> ResultSet {
        ResultSet::new(
            vec!["id".into(), "name".into(), "email".into()],
            vec![
                vec![json!(1), json!("alice"), json!("a@example.com")],
                vec![json!(2), json!("bob"), Value::Null],
            ],
        )
    }

    #[test]
    fn test_positional_passthrough() {
        let rows = Projection::Positional
            .apply(&["id", "name", "email"], result())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![json!(1), json!("alice"), json!("a@example.com")]);
    }

    #[test]
    fn test_positional_narrow_result() {
        let err = Projection::Positional
            .apply(&["id", "name", "email", "phone"], result())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ColumnNotSelected {
                column: "phone".to_string()
            }
        );
    }

    #[test]
    fn test_by_name_reorders_and_drops() {
        let rows = Projection::ByName.apply(&["email", "id"], result()).unwrap();
        assert_eq!(rows[0], vec![json!("a@example.com"), json!(1)]);
        assert_eq!(rows[1], vec![Value::Null, json!(2)]);
    }

    #[test]
    fn test_by_name_unqualified_fallback() {
        let rows = Projection::ByName.apply(&["u.name"], result()).unwrap();
        assert_eq!(rows[1], vec![json!("bob")]);
    }

    #[test]
    fn test_by_name_missing_column() {
        let err = Projection::ByName
            .apply(&["id", "phone"], result())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ColumnNotSelected {
                column: "phone".to_string()
            }
        );
    }
}

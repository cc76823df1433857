//! Static query definition supplied by the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::query::placeholders;

/// A bound SQL parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// Null parameter.
    Null,
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// String parameter.
    String(String),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Creates a float parameter.
    pub fn float(f: f64) -> Self {
        SqlParam::Float(f)
    }

    /// Renders the value as a SQL literal, for log output only.
    pub fn to_sql_literal(&self) -> String {
        match self {
            SqlParam::Null => "NULL".to_string(),
            SqlParam::Integer(i) => i.to_string(),
            SqlParam::Float(f) => f.to_string(),
            SqlParam::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Null => write!(f, "null"),
            SqlParam::Integer(i) => write!(f, "{}", i),
            SqlParam::Float(v) => write!(f, "{}", v),
            SqlParam::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::String(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::String(s)
    }
}

impl From<i64> for SqlParam {
    fn from(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl From<f64> for SqlParam {
    fn from(f: f64) -> Self {
        SqlParam::Float(f)
    }
}

/// The trusted, static part of a table query.
///
/// Holds the `FROM` fragment, an optional `WHERE` fragment with its bound
/// parameters, and an optional `SELECT` override. Fragments are raw SQL taken
/// from configuration and never from request input. A descriptor can only be
/// built through validated construction, so every instance satisfies:
///
/// - `from` starts with `FROM`, `where` with `WHERE`, `select` with `SELECT`
/// - every `:name` placeholder in `where` has exactly one parameter, and every
///   parameter is referenced by `where`
///
/// # Example
///
/// ```
/// use tabledata_persistence::types::{QueryDescriptor, SqlParam};
///
/// let descriptor = QueryDescriptor::new(" FROM cc.user ")?
///     .with_where(
///         " WHERE last_activity BETWEEN :start_date AND :end_date ",
///         [
///             ("start_date", SqlParam::from("2015-03-18")),
///             ("end_date", SqlParam::from("2016-03-18")),
///         ],
///     )?;
///
/// assert_eq!(descriptor.from_clause(), "FROM cc.user");
/// assert_eq!(descriptor.params().len(), 2);
/// # Ok::<(), tabledata_persistence::error::ConfigurationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryDescriptor", into = "RawQueryDescriptor")]
pub struct QueryDescriptor {
    from: String,
    where_clause: Option<String>,
    params: BTreeMap<String, SqlParam>,
    select: Option<String>,
}

/// Unvalidated wire form of a [`QueryDescriptor`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawQueryDescriptor {
    /// The FROM fragment.
    #[serde(default)]
    pub from: Option<String>,
    /// The WHERE fragment.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    /// Parameters bound by the WHERE fragment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, SqlParam>,
    /// SELECT override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
}

impl TryFrom<RawQueryDescriptor> for QueryDescriptor {
    type Error = ConfigurationError;

    fn try_from(raw: RawQueryDescriptor) -> Result<Self, Self::Error> {
        let from = raw.from.ok_or(ConfigurationError::MissingFrom)?;
        let mut descriptor = QueryDescriptor::new(from)?;
        if let Some(where_clause) = raw.where_clause {
            descriptor = descriptor.with_where(where_clause, raw.params)?;
        } else {
            check_bindings(None, &normalize_params(raw.params))?;
        }
        if let Some(select) = raw.select {
            descriptor = descriptor.with_select(select)?;
        }
        Ok(descriptor)
    }
}

impl From<QueryDescriptor> for RawQueryDescriptor {
    fn from(descriptor: QueryDescriptor) -> Self {
        RawQueryDescriptor {
            from: Some(descriptor.from),
            where_clause: descriptor.where_clause,
            params: descriptor.params,
            select: descriptor.select,
        }
    }
}

impl QueryDescriptor {
    /// Creates a descriptor from a mandatory `FROM` fragment.
    pub fn new(from: impl Into<String>) -> Result<Self, ConfigurationError> {
        let from = from.into();
        let from = from.trim();
        if from.is_empty() {
            return Err(ConfigurationError::MissingFrom);
        }
        require_keyword("from", "FROM", from)?;

        Ok(Self {
            from: from.to_string(),
            where_clause: None,
            params: BTreeMap::new(),
            select: None,
        })
    }

    /// Sets the static `WHERE` fragment and the parameters it binds.
    ///
    /// Parameter names may be given with or without a leading `:`.
    pub fn with_where<I, K>(
        mut self,
        where_clause: impl Into<String>,
        params: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, SqlParam)>,
        K: Into<String>,
    {
        let where_clause = where_clause.into().trim().to_string();
        require_keyword("where", "WHERE", &where_clause)?;

        let params = normalize_params(params);
        check_bindings(Some(&where_clause), &params)?;

        self.where_clause = Some(where_clause);
        self.params = params;
        Ok(self)
    }

    /// Sets a `SELECT` override used instead of the derived column list.
    pub fn with_select(mut self, select: impl Into<String>) -> Result<Self, ConfigurationError> {
        let select = select.into().trim().to_string();
        require_keyword("select", "SELECT", &select)?;
        self.select = Some(select);
        Ok(self)
    }

    /// Returns the `FROM` fragment.
    pub fn from_clause(&self) -> &str {
        &self.from
    }

    /// Returns the static `WHERE` fragment, if any.
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Returns the parameters bound by the static `WHERE` fragment.
    pub fn params(&self) -> &BTreeMap<String, SqlParam> {
        &self.params
    }

    /// Returns the `SELECT` override, if any.
    pub fn select_override(&self) -> Option<&str> {
        self.select.as_deref()
    }
}

fn normalize_params<I, K>(params: I) -> BTreeMap<String, SqlParam>
where
    I: IntoIterator<Item = (K, SqlParam)>,
    K: Into<String>,
{
    params
        .into_iter()
        .map(|(name, value)| {
            let name: String = name.into();
            let name = name.strip_prefix(':').map(str::to_string).unwrap_or(name);
            (name, value)
        })
        .collect()
}

/// Checks that a fragment starts with `keyword` followed by whitespace.
fn require_keyword(
    clause: &'static str,
    keyword: &'static str,
    fragment: &str,
) -> Result<(), ConfigurationError> {
    let matches = fragment
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && fragment[keyword.len()..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);

    if matches {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidFragment {
            clause,
            expected: keyword,
            fragment: fragment.to_string(),
        })
    }
}

/// Enforces a one-to-one mapping between placeholders and parameters.
fn check_bindings(
    where_clause: Option<&str>,
    params: &BTreeMap<String, SqlParam>,
) -> Result<(), ConfigurationError> {
    let referenced: BTreeSet<&str> = where_clause
        .map(|sql| placeholders::scan(sql).into_iter().map(|p| p.name).collect())
        .unwrap_or_default();

    if let Some(name) = referenced.iter().find(|name| !params.contains_key(**name)) {
        return Err(ConfigurationError::UnboundPlaceholder {
            name: name.to_string(),
        });
    }
    if let Some(name) = params.keys().find(|name| !referenced.contains(name.as_str())) {
        return Err(ConfigurationError::UnusedParameter { name: name.clone() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_validates_from() {
        let descriptor = QueryDescriptor::new(" FROM cc.user").unwrap();
        assert_eq!(descriptor.from_clause(), "FROM cc.user");
        assert!(descriptor.where_clause().is_none());
        assert!(descriptor.params().is_empty());
    }

    #[test]
    fn test_missing_from() {
        assert_eq!(
            QueryDescriptor::new("   ").unwrap_err(),
            ConfigurationError::MissingFrom
        );
    }

    #[test]
    fn test_from_requires_keyword() {
        let err = QueryDescriptor::new("users").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidFragment { clause: "from", .. }
        ));
        assert!(QueryDescriptor::new("FROMusers").is_err());
        assert!(QueryDescriptor::new("from users").is_ok());
    }

    #[test]
    fn test_where_with_params() {
        let descriptor = QueryDescriptor::new("FROM events")
            .unwrap()
            .with_where(
                "WHERE kind = :kind AND at > :since::date",
                [
                    (":kind", SqlParam::from("login")),
                    ("since", SqlParam::from("2024-01-01")),
                ],
            )
            .unwrap();

        assert_eq!(descriptor.params().len(), 2);
        assert!(descriptor.params().contains_key("kind"));
    }

    #[test]
    fn test_where_unbound_placeholder() {
        let err = QueryDescriptor::new("FROM events")
            .unwrap()
            .with_where("WHERE kind = :kind", Vec::<(String, SqlParam)>::new())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnboundPlaceholder {
                name: "kind".to_string()
            }
        );
    }

    #[test]
    fn test_where_unused_parameter() {
        let err = QueryDescriptor::new("FROM events")
            .unwrap()
            .with_where(
                "WHERE kind = 'login'",
                [("kind", SqlParam::from("login"))],
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnusedParameter {
                name: "kind".to_string()
            }
        );
    }

    #[test]
    fn test_select_override_requires_keyword() {
        let descriptor = QueryDescriptor::new("FROM t").unwrap();
        assert!(descriptor.clone().with_select("SELECT id, name").is_ok());
        assert!(descriptor.with_select("id, name").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let descriptor: QueryDescriptor = serde_json::from_value(serde_json::json!({
            "from": " FROM cc.user",
            "where": " WHERE last_activity BETWEEN :start_date AND :end_date ",
            "params": {"start_date": "2015-03-18", "end_date": "2016-03-18"}
        }))
        .unwrap();
        assert_eq!(descriptor.where_clause().unwrap(), "WHERE last_activity BETWEEN :start_date AND :end_date");

        let missing_from = serde_json::from_value::<QueryDescriptor>(serde_json::json!({
            "where": "WHERE a = 1"
        }));
        assert!(missing_from.is_err());

        let stray_params = serde_json::from_value::<QueryDescriptor>(serde_json::json!({
            "from": "FROM t",
            "params": {"a": 1}
        }));
        assert!(stray_params.is_err());
    }

    #[test]
    fn test_param_untagged_serde() {
        let params: BTreeMap<String, SqlParam> = serde_json::from_value(serde_json::json!({
            "a": "text", "b": 7, "c": 1.5, "d": null
        }))
        .unwrap();
        assert_eq!(params["a"], SqlParam::string("text"));
        assert_eq!(params["b"], SqlParam::integer(7));
        assert_eq!(params["c"], SqlParam::float(1.5));
        assert_eq!(params["d"], SqlParam::Null);
    }
}

//! DataTables server-side request extractor.
//!
//! The grid sends its state as bracket-style keys, either in the query string
//! (`GET`) or as a form body (`POST`):
//!
//! ```text
//! draw=3&start=20&length=10&search[value]=smith
//! &columns[0][data]=username&columns[0][searchable]=true&columns[0][orderable]=true
//! &order[0][column]=0&order[0][dir]=desc
//! ```
//!
//! A `POST` with `Content-Type: application/json` carries the same structure as
//! a JSON document. Both shapes are folded into one JSON tree and read
//! leniently: numbers may arrive as strings and booleans as `true`, `1`, `on`
//! or `yes`.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request},
    http::{Method, header},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tabledata_persistence::types::{ColumnSpec, RequestDescriptor, SortDirection, SortDirective};

use crate::error::{RestError, RestResult};

/// Raw grid parameters as sent by the client.
///
/// Call [`DataTablesParams::into_request`] to validate them into a
/// [`RequestDescriptor`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataTablesParams {
    #[serde(default)]
    draw: Option<Value>,
    #[serde(default)]
    start: Option<Value>,
    #[serde(default)]
    length: Option<Value>,
    #[serde(default)]
    columns: Vec<WireColumn>,
    #[serde(default)]
    order: Vec<WireOrder>,
    #[serde(default)]
    search: Option<WireSearch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireColumn {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    searchable: Option<Value>,
    #[serde(default)]
    orderable: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireOrder {
    #[serde(default)]
    column: Option<Value>,
    #[serde(default)]
    dir: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireSearch {
    #[serde(default)]
    value: Option<Value>,
}

impl DataTablesParams {
    /// Builds parameters from decoded `key=value` pairs with bracket keys.
    pub fn from_pairs<I, K, V>(pairs: I) -> RestResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_json(nest_pairs(pairs)?)
    }

    /// Builds parameters from a JSON document.
    pub fn from_json(value: Value) -> RestResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| RestError::bad_request(format!("malformed request parameters: {}", e)))
    }

    /// Validates the parameters into a [`RequestDescriptor`].
    ///
    /// `default_length` applies when the request omits `length`.
    pub fn into_request(self, default_length: u64) -> RestResult<RequestDescriptor> {
        let draw = optional_int("draw", self.draw.as_ref())?.unwrap_or(0);

        let start = match optional_int("start", self.start.as_ref())? {
            Some(start) if start < 0 => {
                return Err(RestError::bad_request(format!(
                    "start must not be negative, got {}",
                    start
                )));
            }
            Some(start) => start as u64,
            None => 0,
        };

        let length = match optional_int("length", self.length.as_ref())? {
            None => Some(default_length),
            Some(-1) => None,
            Some(length) if length < 0 => {
                return Err(RestError::bad_request(format!(
                    "length must be -1 or non-negative, got {}",
                    length
                )));
            }
            Some(length) => Some(length as u64),
        };

        let columns = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, column)| column.into_spec(i))
            .collect::<RestResult<Vec<_>>>()?;

        let order = self
            .order
            .into_iter()
            .enumerate()
            .map(|(i, order)| order.into_directive(i))
            .collect::<RestResult<Vec<_>>>()?;

        let mut request = RequestDescriptor::new(columns)
            .with_order(order)
            .with_page(start, length)
            .with_draw(draw);

        if let Some(search) = self.search.and_then(|s| s.value) {
            request = request.with_search(text("search[value]", &search)?);
        }

        Ok(request)
    }
}

impl WireColumn {
    fn into_spec(self, index: usize) -> RestResult<ColumnSpec> {
        let field = |name: &str| format!("columns[{}][{}]", index, name);

        let name = match self.name.as_ref() {
            Some(name) => text(&field("name"), name)?,
            None => String::new(),
        };
        let name = if name.trim().is_empty() {
            match self.data.as_ref() {
                Some(data) => text(&field("data"), data)?,
                None => String::new(),
            }
        } else {
            name
        };

        let searchable = optional_bool(&field("searchable"), self.searchable.as_ref())?;
        let orderable = optional_bool(&field("orderable"), self.orderable.as_ref())?;

        Ok(ColumnSpec::new(name.trim())
            .searchable(searchable.unwrap_or(true))
            .orderable(orderable.unwrap_or(true)))
    }
}

impl WireOrder {
    fn into_directive(self, index: usize) -> RestResult<SortDirective> {
        let field = format!("order[{}][column]", index);
        let column = optional_int(&field, self.column.as_ref())?
            .ok_or_else(|| RestError::bad_request(format!("{} is required", field)))?;
        let column = usize::try_from(column).map_err(|_| {
            RestError::bad_request(format!("{} must not be negative, got {}", field, column))
        })?;

        let direction = match self.dir.as_ref() {
            Some(dir) => {
                let dir = text(&format!("order[{}][dir]", index), dir)?;
                if dir.trim().is_empty() {
                    SortDirection::Asc
                } else {
                    SortDirection::from_str(&dir).map_err(|e| RestError::bad_request(e.to_string()))?
                }
            }
            None => SortDirection::Asc,
        };

        Ok(SortDirective::new(column, direction))
    }
}

/// Reads an integer that may arrive as a JSON number or a string.
///
/// An empty string counts as absent.
fn optional_int(field: &str, value: Option<&Value>) -> RestResult<Option<i64>> {
    let invalid = |v: String| {
        RestError::bad_request(format!("{} must be an integer, got '{}'", field, v))
    };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| invalid(n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(s.clone())),
        Some(other) => Err(invalid(other.to_string())),
    }
}

/// Reads a boolean given as a JSON bool, `0`/`1`, or a string flag.
fn optional_bool(field: &str, value: Option<&Value>) -> RestResult<Option<bool>> {
    let invalid = |v: String| {
        RestError::bad_request(format!("{} must be a boolean, got '{}'", field, v))
    };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            _ => Err(invalid(n.to_string())),
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "on" | "yes" => Ok(Some(true)),
            "false" | "0" | "off" | "no" => Ok(Some(false)),
            _ => Err(invalid(s.clone())),
        },
        Some(other) => Err(invalid(other.to_string())),
    }
}

/// Reads a scalar as text.
fn text(field: &str, value: &Value) -> RestResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(RestError::bad_request(format!("{} must be a scalar", field))),
    }
}

/// Folds bracket-style pairs into a JSON tree.
///
/// `columns[0][name]=id` becomes `{"columns": [{"name": "id"}]}`. Objects whose
/// keys are all array indices become arrays; the indices must run from 0
/// without gaps. A repeated key keeps its last value.
pub fn nest_pairs<I, K, V>(pairs: I) -> RestResult<Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = Map::new();
    for (key, value) in pairs {
        let key = key.as_ref();
        let path = split_key(key)?;
        insert(&mut root, key, &path, value.into())?;
    }
    for child in root.values_mut() {
        arrays_from_indices(child)?;
    }
    Ok(Value::Object(root))
}

fn split_key(key: &str) -> RestResult<Vec<&str>> {
    let malformed = || RestError::bad_request(format!("malformed parameter name '{}'", key));

    let Some(open) = key.find('[') else {
        return Ok(vec![key]);
    };
    let mut path = vec![&key[..open]];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let close = inner.find(']').ok_or_else(malformed)?;
        path.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if path[0].is_empty() {
        return Err(malformed());
    }
    Ok(path)
}

fn insert(node: &mut Map<String, Value>, key: &str, path: &[&str], value: String) -> RestResult<()> {
    let conflict = || RestError::bad_request(format!("conflicting parameter '{}'", key));

    match path {
        [] => Ok(()),
        [last] => {
            if matches!(node.get(*last), Some(Value::Object(_))) {
                return Err(conflict());
            }
            node.insert((*last).to_string(), Value::String(value));
            Ok(())
        }
        [head, tail @ ..] => {
            let child = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match child {
                Value::Object(map) => insert(map, key, tail, value),
                _ => Err(conflict()),
            }
        }
    }
}

fn arrays_from_indices(value: &mut Value) -> RestResult<()> {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for child in map.values_mut() {
        arrays_from_indices(child)?;
    }

    if map.is_empty() || !map.keys().all(|k| is_index(k)) {
        return Ok(());
    }

    let mut indexed = BTreeMap::new();
    for (k, v) in std::mem::take(map) {
        if let Ok(i) = k.parse::<usize>() {
            indexed.insert(i, v);
        }
    }
    if indexed.keys().enumerate().any(|(expected, i)| expected != *i) {
        return Err(RestError::bad_request(
            "array parameters must be numbered from 0 without gaps",
        ));
    }
    *value = Value::Array(indexed.into_values().collect());
    Ok(())
}

fn is_index(key: &str) -> bool {
    key.parse::<usize>().is_ok_and(|i| i.to_string() == key)
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json") || ct.contains("+json"))
}

impl<S> FromRequest<S> for DataTablesParams
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.method() == Method::GET || req.method() == Method::HEAD {
            let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
                .map_err(|e| RestError::bad_request(e.body_text()))?;
            return Self::from_pairs(pairs);
        }

        if is_json(&req) {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| RestError::bad_request(e.body_text()))?;
            return Self::from_json(value);
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| RestError::bad_request(e.body_text()))?;
        Self::from_pairs(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::json;

    fn pairs(query: &[(&str, &str)]) -> DataTablesParams {
        DataTablesParams::from_pairs(query.iter().map(|(k, v)| (*k, *v))).unwrap()
    }

    #[test]
    fn test_nest_pairs() {
        let tree = nest_pairs([
            ("draw", "2"),
            ("columns[0][data]", "id"),
            ("columns[1][data]", "name"),
            ("columns[1][searchable]", "false"),
            ("search[value]", "bo"),
        ])
        .unwrap();
        assert_eq!(
            tree,
            json!({
                "draw": "2",
                "columns": [{"data": "id"}, {"data": "name", "searchable": "false"}],
                "search": {"value": "bo"}
            })
        );
    }

    #[test]
    fn test_nest_pairs_rejects_gaps() {
        assert!(nest_pairs([("columns[0][data]", "id"), ("columns[2][data]", "x")]).is_err());
    }

    #[test]
    fn test_nest_pairs_rejects_conflicts() {
        assert!(nest_pairs([("search", "x"), ("search[value]", "y")]).is_err());
        assert!(nest_pairs([("search[value]", "y"), ("search", "x")]).is_err());
    }

    #[test]
    fn test_nest_pairs_rejects_malformed_keys() {
        assert!(nest_pairs([("columns[0", "id")]).is_err());
        assert!(nest_pairs([("[0]", "id")]).is_err());
    }

    #[test]
    fn test_full_request() {
        let request = pairs(&[
            ("draw", "3"),
            ("start", "20"),
            ("length", "10"),
            ("search[value]", "smith"),
            ("columns[0][data]", "id"),
            ("columns[0][searchable]", "false"),
            ("columns[1][data]", "username"),
            ("columns[1][name]", "u.username"),
            ("columns[1][orderable]", "on"),
            ("order[0][column]", "1"),
            ("order[0][dir]", "desc"),
            ("order[1][column]", "0"),
            ("order[1][dir]", "ASC"),
            ("_", "1712345678"),
        ])
        .into_request(10)
        .unwrap();

        assert_eq!(request.draw(), 3);
        assert_eq!(request.start(), 20);
        assert_eq!(request.length(), Some(10));
        assert_eq!(request.search_term(), Some("smith"));
        assert_eq!(request.column_names(), vec!["id", "u.username"]);
        assert_eq!(request.searchable_columns(), vec!["u.username"]);
        assert_eq!(
            request.order(),
            &[
                SortDirective::new(1, SortDirection::Desc),
                SortDirective::new(0, SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn test_defaults() {
        let request = pairs(&[("columns[0][data]", "id")])
            .into_request(25)
            .unwrap();
        assert_eq!(request.draw(), 0);
        assert_eq!(request.start(), 0);
        assert_eq!(request.length(), Some(25));
        assert!(request.search_term().is_none());
        assert!(request.order().is_empty());
        assert!(request.columns()[0].searchable);
        assert!(request.columns()[0].orderable);
    }

    #[test]
    fn test_length_all_rows() {
        let request = pairs(&[("length", "-1")]).into_request(10).unwrap();
        assert_eq!(request.length(), None);
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(pairs(&[("start", "-5")]).into_request(10).is_err());
        assert!(pairs(&[("length", "-2")]).into_request(10).is_err());
        assert!(
            pairs(&[("order[0][column]", "-1"), ("order[0][dir]", "asc")])
                .into_request(10)
                .is_err()
        );
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(pairs(&[("start", "ten")]).into_request(10).is_err());
        assert!(pairs(&[("draw", "1.5")]).into_request(10).is_err());
        assert!(
            pairs(&[("columns[0][data]", "id"), ("columns[0][searchable]", "maybe")])
                .into_request(10)
                .is_err()
        );
        assert!(
            pairs(&[("order[0][column]", "0"), ("order[0][dir]", "sideways")])
                .into_request(10)
                .is_err()
        );
    }

    #[test]
    fn test_json_body() {
        let params = DataTablesParams::from_json(json!({
            "draw": 7,
            "start": 0,
            "length": -1,
            "columns": [
                {"data": "id", "name": "", "searchable": false, "orderable": true},
                {"data": "name", "name": "", "searchable": true, "orderable": false}
            ],
            "order": [{"column": 0, "dir": "desc"}],
            "search": {"value": "", "regex": false}
        }))
        .unwrap();

        let request = params.into_request(10).unwrap();
        assert_eq!(request.draw(), 7);
        assert_eq!(request.length(), None);
        assert_eq!(request.column_names(), vec!["id", "name"]);
        assert!(!request.columns()[1].orderable);
        assert!(request.search_term().is_none());
    }

    #[tokio::test]
    async fn test_extract_from_get() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/tables/users?draw=4&columns%5B0%5D%5Bdata%5D=id&length=5")
            .body(Body::empty())
            .unwrap();

        let params = DataTablesParams::from_request(req, &()).await.unwrap();
        let request = params.into_request(10).unwrap();
        assert_eq!(request.draw(), 4);
        assert_eq!(request.length(), Some(5));
        assert_eq!(request.column_names(), vec!["id"]);
    }

    #[tokio::test]
    async fn test_extract_from_form_post() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/tables/users")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("draw=9&columns[0][data]=name&search[value]=al"))
            .unwrap();

        let params = DataTablesParams::from_request(req, &()).await.unwrap();
        let request = params.into_request(10).unwrap();
        assert_eq!(request.draw(), 9);
        assert_eq!(request.search_term(), Some("al"));
    }

    #[tokio::test]
    async fn test_extract_from_json_post() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/tables/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"draw": "2", "columns": [{"data": "id"}]}"#))
            .unwrap();

        let params = DataTablesParams::from_request(req, &()).await.unwrap();
        assert_eq!(params.into_request(10).unwrap().draw(), 2);
    }

    #[tokio::test]
    async fn test_extract_rejects_bad_json() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/tables/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = DataTablesParams::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }
}

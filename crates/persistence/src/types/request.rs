//! Per-request view parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Page length used when the request does not specify one.
pub const DEFAULT_PAGE_LENGTH: u64 = 10;

/// One column of the grid as requested by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name, used verbatim in the generated SQL.
    pub name: String,
    /// Whether the column takes part in the free-text search.
    pub searchable: bool,
    /// Whether the client may sort on this column.
    pub orderable: bool,
}

impl ColumnSpec {
    /// Creates a searchable, orderable column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            searchable: true,
            orderable: true,
        }
    }

    /// Sets the searchable flag.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Sets the orderable flag.
    pub fn orderable(mut self, orderable: bool) -> Self {
        self.orderable = orderable;
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortDirection {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(RequestError::InvalidSortDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// A sort directive: index into the requested columns plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// Index into [`RequestDescriptor::columns`].
    pub column: usize,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Creates a sort directive.
    pub fn new(column: usize, direction: SortDirection) -> Self {
        Self { column, direction }
    }
}

/// Everything the grid asked for in one request.
///
/// Built once per inbound request and handed to the composer; the composer
/// never reads request state from anywhere else.
///
/// # Example
///
/// ```
/// use tabledata_persistence::types::{ColumnSpec, RequestDescriptor, SortDirection, SortDirective};
///
/// let request = RequestDescriptor::new(vec![
///     ColumnSpec::new("username"),
///     ColumnSpec::new("last_activity").searchable(false),
/// ])
/// .with_search("smith")
/// .with_order(vec![SortDirective::new(1, SortDirection::Desc)])
/// .with_page(20, Some(10))
/// .with_draw(3);
///
/// assert_eq!(request.search_term(), Some("smith"));
/// assert_eq!(request.searchable_columns(), vec!["username"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    columns: Vec<ColumnSpec>,
    search: Option<String>,
    order: Vec<SortDirective>,
    start: u64,
    length: Option<u64>,
    draw: i64,
}

impl Default for RequestDescriptor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RequestDescriptor {
    /// Creates a request for the given columns with default paging.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            search: None,
            order: Vec::new(),
            start: 0,
            length: Some(DEFAULT_PAGE_LENGTH),
            draw: 0,
        }
    }

    /// Sets the free-text search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the sort directives, first one being the primary key.
    pub fn with_order(mut self, order: Vec<SortDirective>) -> Self {
        self.order = order;
        self
    }

    /// Sets the page offset and length; `None` length requests every row.
    pub fn with_page(mut self, start: u64, length: Option<u64>) -> Self {
        self.start = start;
        self.length = length;
        self
    }

    /// Sets the draw counter echoed back in the response.
    pub fn with_draw(mut self, draw: i64) -> Self {
        self.draw = draw;
        self
    }

    /// Returns the requested columns in display order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the requested column names in display order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns the searchable column names, first occurrence order, without duplicates.
    pub fn searchable_columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for column in self.columns.iter().filter(|c| c.searchable) {
            if !names.contains(&column.name.as_str()) {
                names.push(&column.name);
            }
        }
        names
    }

    /// Returns the trimmed search term when it is non-empty.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Returns the sort directives.
    pub fn order(&self) -> &[SortDirective] {
        &self.order
    }

    /// Returns the page offset.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Returns the page length, `None` meaning every row.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Returns the draw counter.
    pub fn draw(&self) -> i64 {
        self.draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = RequestDescriptor::new(vec![ColumnSpec::new("id")]);
        assert_eq!(request.start(), 0);
        assert_eq!(request.length(), Some(10));
        assert_eq!(request.draw(), 0);
        assert!(request.search_term().is_none());
        assert!(request.order().is_empty());
    }

    #[test]
    fn test_blank_search_is_inactive() {
        let request = RequestDescriptor::default().with_search("   ");
        assert!(request.search_term().is_none());

        let request = RequestDescriptor::default().with_search("  bob ");
        assert_eq!(request.search_term(), Some("bob"));
    }

    #[test]
    fn test_searchable_columns_deduplicated() {
        let request = RequestDescriptor::new(vec![
            ColumnSpec::new("name"),
            ColumnSpec::new("id").searchable(false),
            ColumnSpec::new("name"),
            ColumnSpec::new("email"),
        ]);
        assert_eq!(request.searchable_columns(), vec!["name", "email"]);
        assert_eq!(request.column_names(), vec!["name", "id", "name", "email"]);
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(
            "sideways".parse::<SortDirection>().unwrap_err(),
            RequestError::InvalidSortDirection {
                value: "sideways".to_string()
            }
        );
    }
}

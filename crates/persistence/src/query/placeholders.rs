//! Named placeholder scanning.
//!
//! Composed SQL always uses `:name` placeholders. This module finds them while
//! skipping quoted text, line comments and PostgreSQL `::` casts, so the same
//! scan backs descriptor validation, the positional rewrite PostgreSQL needs,
//! and the parameter-inlined SQL used for logging.

use std::collections::BTreeMap;

use crate::types::SqlParam;

/// A `:name` placeholder occurrence inside a SQL string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The name without the leading colon.
    pub name: &'a str,
    /// Byte offset of the colon.
    pub start: usize,
    /// Byte offset one past the last name character.
    pub end: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns every placeholder in `sql`, in order of appearance.
pub fn scan(sql: &str) -> Vec<Placeholder<'_>> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut found = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                i += 1;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b':' => {
                let start = i;
                let mut end = i + 1;
                if end < len && is_ident_start(bytes[end]) {
                    end += 1;
                    while end < len && is_ident_continue(bytes[end]) {
                        end += 1;
                    }
                    found.push(Placeholder {
                        name: &sql[start + 1..end],
                        start,
                        end,
                    });
                }
                i = end;
            }
            _ => i += 1,
        }
    }

    found
}

/// Rewrites `:name` placeholders to `$n`.
///
/// Numbers are assigned per distinct name in order of first appearance, so a
/// name used twice binds once. Returns the rewritten SQL and the names in
/// positional order.
pub fn to_positional(sql: &str) -> (String, Vec<&str>) {
    let mut names: Vec<&str> = Vec::new();
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for placeholder in scan(sql) {
        let position = match names.iter().position(|n| *n == placeholder.name) {
            Some(idx) => idx + 1,
            None => {
                names.push(placeholder.name);
                names.len()
            }
        };
        out.push_str(&sql[last..placeholder.start]);
        out.push('$');
        out.push_str(&position.to_string());
        last = placeholder.end;
    }
    out.push_str(&sql[last..]);

    (out, names)
}

/// Substitutes parameter literals for placeholders.
///
/// Only meant for log output: the result is never executed. Placeholders with
/// no matching parameter are left as they are.
pub fn inline(sql: &str, params: &BTreeMap<String, SqlParam>) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for placeholder in scan(sql) {
        if let Some(value) = params.get(placeholder.name) {
            out.push_str(&sql[last..placeholder.start]);
            out.push_str(&value.to_sql_literal());
            last = placeholder.end;
        }
    }
    out.push_str(&sql[last..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(sql: &str) -> Vec<&str> {
        scan(sql).into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_scan_simple() {
        assert_eq!(
            names("WHERE last_activity BETWEEN :start_date AND :end_date"),
            vec!["start_date", "end_date"]
        );
    }

    #[test]
    fn test_scan_skips_casts_and_literals() {
        let sql = "WHERE created::date > :since AND note <> ':not_a_param' AND \"a:b\" = :x";
        assert_eq!(names(sql), vec!["since", "x"]);
    }

    #[test]
    fn test_scan_placeholder_followed_by_cast() {
        assert_eq!(names("WHERE d > :since::date"), vec!["since"]);
    }

    #[test]
    fn test_scan_skips_line_comments() {
        assert_eq!(names("WHERE a = :a -- :b\nAND c = :c"), vec!["a", "c"]);
    }

    #[test]
    fn test_scan_ignores_bare_colon() {
        assert!(names("SELECT ':' || name, 1 : 2").is_empty());
    }

    #[test]
    fn test_to_positional_reuses_numbers() {
        let (sql, order) = to_positional("WHERE a = :x OR b = :y OR c = :x");
        assert_eq!(sql, "WHERE a = $1 OR b = $2 OR c = $1");
        assert_eq!(order, vec!["x", "y"]);
    }

    #[test]
    fn test_to_positional_keeps_casts() {
        let (sql, order) = to_positional("WHERE d > :since::date AND e::text ILIKE :q");
        assert_eq!(sql, "WHERE d > $1::date AND e::text ILIKE $2");
        assert_eq!(order, vec!["since", "q"]);
    }

    #[test]
    fn test_inline_quotes_strings() {
        let mut params = BTreeMap::new();
        params.insert("name".to_string(), SqlParam::string("O'Brien"));
        params.insert("age".to_string(), SqlParam::integer(42));
        assert_eq!(
            inline("WHERE name = :name AND age > :age AND x = :missing", &params),
            "WHERE name = 'O''Brien' AND age > 42 AND x = :missing"
        );
    }
}

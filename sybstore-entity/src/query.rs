use crate::value::Value;
use std::collections::BTreeMap;

/// Sort direction as it renders into SQL (`ASC` / `DESC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

/// A query against one entity kind: equality filters, an optional single-field
/// sort, an optional result limit, and the bulk-delete intent flag.
///
/// ```
/// use sybstore_entity::{Direction, Query};
///
/// let q = Query::new()
///     .filter("status", "active")
///     .sort("created_at", Direction::Descending)
///     .limit(10);
/// assert_eq!(q.result_limit(), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    filters: BTreeMap<String, Value>,
    sort: Option<Sort>,
    limit: Option<u64>,
    all: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from a flat field map, extracting the `$`-suffixed
    /// modifier markers (`sort$`, `limit$`, `all$`) and silently dropping any
    /// other marker so it never leaks into a WHERE clause. Everything else
    /// becomes an equality filter.
    ///
    /// The sort marker is a one-entry map of field → number. A negative
    /// marker maps to [`Direction::Ascending`], non-negative to
    /// [`Direction::Descending`]; callers wanting the conventional mapping
    /// should use [`Query::sort`] with an explicit direction.
    pub fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        let mut q = Query::new();
        for (key, value) in fields {
            match key.as_str() {
                "sort$" => {
                    if let Value::Map(spec) = value {
                        if let Some((field, marker)) = spec.into_iter().next() {
                            let direction = match marker {
                                Value::Number(n) if n < 0.0 => Direction::Ascending,
                                _ => Direction::Descending,
                            };
                            q.sort = Some(Sort { field, direction });
                        }
                    }
                }
                "limit$" => {
                    if let Value::Number(n) = value {
                        if n >= 0.0 {
                            q.limit = Some(n as u64);
                        }
                    }
                }
                "all$" => {
                    q.all = matches!(value, Value::Bool(true));
                }
                _ if key.ends_with('$') => {
                    // Unknown modifier marker, not a field constraint.
                }
                _ => {
                    q.filters.insert(key, value);
                }
            }
        }
        q
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Mark bulk intent: a delete with no filters and this flag set removes
    /// every row in the table.
    pub fn match_all(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn filters(&self) -> &BTreeMap<String, Value> {
        &self.filters
    }

    pub fn sort_spec(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn result_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn is_match_all(&self) -> bool {
        self.all
    }
}

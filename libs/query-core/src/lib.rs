//! Transport-agnostic list query model.
//!
//! A `ListQuery` is built from the raw URL query map of a list endpoint:
//! every key outside of `page`, `sort`, `limit` and `fields` becomes a field
//! filter (`price=5`, `price[gte]=5`), `sort` is a comma separated list of
//! fields with an optional `-` prefix, `fields` is a projection allow-list and
//! `page`/`limit` drive offset pagination.
//!
//! Translation into store clauses lives in `apikit-db`; this crate only parses.

use thiserror::Error;

pub mod page;
pub use page::{LimitCfg, PageRequest, MAX_SQL_OFFSET};

pub mod ast {
    /// Comparison operator of a single field filter.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CompareOperator {
        Eq,
        Gt,
        Ge,
        Lt,
        Le,
    }

    impl CompareOperator {
        /// Parse the bracketed operator token of `field[op]`.
        pub fn from_token(token: &str) -> Option<Self> {
            match token {
                "eq" => Some(Self::Eq),
                "gt" => Some(Self::Gt),
                "gte" => Some(Self::Ge),
                "lt" => Some(Self::Lt),
                "lte" => Some(Self::Le),
                _ => None,
            }
        }

        pub fn token(&self) -> &'static str {
            match self {
                Self::Eq => "eq",
                Self::Gt => "gt",
                Self::Ge => "gte",
                Self::Lt => "lt",
                Self::Le => "lte",
            }
        }
    }

    /// `field <op> value` with the value still in its raw textual form;
    /// coercion depends on the field kind and happens at translation time.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct FieldFilter {
        pub field: String,
        pub op: CompareOperator,
        pub value: String,
    }
}

use ast::{CompareOperator, FieldFilter};

pub const MAX_SORT_LEN: usize = 1024;
pub const MAX_SORT_FIELDS: usize = 10;
pub const MAX_FIELDS_LEN: usize = 1024;
pub const MAX_FILTERS: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported operator '{op}' on field '{field}'")]
    UnsupportedOperator { field: String, op: String },

    #[error("malformed filter key: {0}")]
    MalformedKey(String),

    #[error("{0} parameter is too long")]
    TooLong(&'static str),

    #[error("too many sort fields (max {MAX_SORT_FIELDS})")]
    TooManySortFields,

    #[error("too many filters (max {MAX_FILTERS})")]
    TooManyFilters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Multi-key sort specification, in priority order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderBy(pub Vec<OrderKey>);

impl OrderBy {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.0
    }

    /// Parse `name,-price`. Empty segments are skipped, a lone `-` is not a field.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let raw = raw.trim();
        if raw.len() > MAX_SORT_LEN {
            return Err(Error::TooLong("sort"));
        }

        let mut keys = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            let (field, dir) = match part.strip_prefix('-') {
                Some(rest) => (rest.trim(), SortDir::Desc),
                None => (part.strip_prefix('+').unwrap_or(part).trim(), SortDir::Asc),
            };
            if field.is_empty() {
                continue;
            }
            keys.push(OrderKey {
                field: field.to_string(),
                dir,
            });
        }

        if keys.len() > MAX_SORT_FIELDS {
            return Err(Error::TooManySortFields);
        }
        Ok(Self(keys))
    }

    /// Append `field` unless the order already mentions it.
    pub fn ensure_tiebreaker(mut self, field: &str, dir: SortDir) -> Self {
        if !self.0.iter().any(|k| k.field == field) {
            self.0.push(OrderKey {
                field: field.to_string(),
                dir,
            });
        }
        self
    }

    /// Render as the `sort` parameter syntax (`name,-price`).
    pub fn to_param(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => k.field.clone(),
                SortDir::Desc => format!("-{}", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Projection allow-list. Empty means "all fields". Names match ASCII
/// case-insensitively, like field lookups in the store translation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSelection(Vec<String>);

impl FieldSelection {
    pub fn all() -> Self {
        Self(Vec::new())
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        if raw.len() > MAX_FIELDS_LEN {
            return Err(Error::TooLong("fields"));
        }
        let mut fields: Vec<String> = Vec::new();
        for f in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !fields.iter().any(|x| x.eq_ignore_ascii_case(f)) {
                fields.push(f.to_string());
            }
        }
        Ok(Self(fields))
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.is_all() || self.0.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Keep only the selected keys of a serialized record (plus `always`).
    /// Non-object values are returned untouched.
    pub fn project(&self, value: serde_json::Value, always: &[&str]) -> serde_json::Value {
        if self.is_all() {
            return value;
        }
        match value {
            serde_json::Value::Object(mut map) => {
                map.retain(|k, _| {
                    always.iter().any(|a| a.eq_ignore_ascii_case(k))
                        || self.0.iter().any(|f| f.eq_ignore_ascii_case(k))
                });
                serde_json::Value::Object(map)
            }
            other => other,
        }
    }
}

/// Typed form of a list endpoint's query string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<FieldFilter>,
    pub order: OrderBy,
    pub fields: FieldSelection,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Pairs seen by `from_pairs`, including ones that parsed to nothing.
    raw_pairs: usize,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(key, value)` pairs in request order.
    ///
    /// Reserved keys keep their last occurrence; every other key is a filter.
    /// `page`/`limit` are coerced numerically and silently dropped when they are
    /// not positive integers, so the defaults apply.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut q = Self::new();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref().trim(), value.as_ref());
            q.raw_pairs += 1;
            match key {
                "page" => q.page = parse_positive(value),
                "limit" => q.limit = parse_positive(value),
                "sort" => q.order = OrderBy::parse(value)?,
                "fields" => q.fields = FieldSelection::parse(value)?,
                _ => {
                    if q.filters.len() >= MAX_FILTERS {
                        return Err(Error::TooManyFilters);
                    }
                    q.filters.push(parse_filter(key, value)?);
                }
            }
        }
        Ok(q)
    }

    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        op: CompareOperator,
        value: impl Into<String>,
    ) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the query string carried no pairs and nothing was set
    /// through the builders. `?page=abc` or `?sort=` are not empty.
    pub fn is_empty(&self) -> bool {
        self.raw_pairs == 0
            && self.filters.is_empty()
            && self.order.is_empty()
            && self.fields.is_all()
            && self.page.is_none()
            && self.limit.is_none()
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

/// `field` or `field[op]`.
fn parse_filter(key: &str, value: &str) -> Result<FieldFilter, Error> {
    let (field, op) = match key.split_once('[') {
        None => (key, CompareOperator::Eq),
        Some((field, rest)) => {
            let token = rest
                .strip_suffix(']')
                .ok_or_else(|| Error::MalformedKey(key.to_string()))?;
            let op = CompareOperator::from_token(token).ok_or_else(|| {
                Error::UnsupportedOperator {
                    field: field.to_string(),
                    op: token.to_string(),
                }
            })?;
            (field, op)
        }
    };

    if field.is_empty() {
        return Err(Error::MalformedKey(key.to_string()));
    }

    Ok(FieldFilter {
        field: field.to_string(),
        op,
        value: value.to_string(),
    })
}

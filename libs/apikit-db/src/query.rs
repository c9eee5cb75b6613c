//! `ListQuery` → sea_orm clause translator (parsed query in, `Select` out).
//! Parsing of the raw query string belongs to `query-core`.
//!
//! Features are applied in a fixed order: filter, sort, field limiting,
//! pagination. Field limiting only records the allow-list; the caller projects
//! serialized records with it after the fetch.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use query_core::{
    ast::{CompareOperator, FieldFilter},
    FieldSelection, LimitCfg, ListQuery, OrderBy, PageRequest, SortDir,
};
use sea_orm::{
    sea_query::{Expr, LikeExpr, Order, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use thiserror::Error;

/// Whitelisted field kind, used to coerce raw query values into `sea_orm::Value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Uuid,
    DateTimeUtc,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// API field name → column mapping. Lookups ignore ASCII case.
#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map
            .insert(api_name.into().to_ascii_lowercase(), Field { col, kind });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_ascii_lowercase())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryBuildError {
    #[error("invalid value '{value}' for field '{field}' (expected {kind:?})")]
    InvalidValue {
        field: String,
        kind: FieldKind,
        value: String,
    },
}

pub type QueryBuildResult<T> = Result<T, QueryBuildError>;

/* ---------- coercion ---------- */

fn coerce(field: &str, kind: FieldKind, raw: &str) -> QueryBuildResult<sea_orm::Value> {
    let invalid = || QueryBuildError::InvalidValue {
        field: field.to_string(),
        kind,
        value: raw.to_string(),
    };

    Ok(match kind {
        FieldKind::String => raw.to_string().into(),
        FieldKind::I64 => raw.trim().parse::<i64>().map_err(|_| invalid())?.into(),
        FieldKind::F64 => {
            let f = raw.trim().parse::<f64>().map_err(|_| invalid())?;
            if !f.is_finite() {
                return Err(invalid());
            }
            f.into()
        }
        FieldKind::Uuid => uuid::Uuid::parse_str(raw.trim())
            .map_err(|_| invalid())?
            .into(),
        FieldKind::DateTimeUtc => parse_datetime(raw.trim()).ok_or_else(invalid)?.into(),
    })
}

/// RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/* ---------- LIKE helpers ---------- */

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

/// Case folding for case-insensitive lookups.
///
/// SQLite's `LOWER` only folds ASCII, so folded text is computed here and
/// kept in a shadow column written alongside the original value.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Literal substring match on a column holding [`fold_case`]d text:
/// `col LIKE '%needle%' ESCAPE '\'`.
pub fn contains_folded<C: ColumnTrait>(folded: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", like_escape(&fold_case(needle)));
    Expr::col(folded).like(LikeExpr::new(pattern).escape('\\'))
}

/// Exact match on a column holding [`fold_case`]d text.
pub fn folded_eq<C: ColumnTrait>(folded: C, value: &str) -> SimpleExpr {
    Expr::col(folded).eq(fold_case(value))
}

/* ---------- FieldFilter -> Condition ---------- */

/// Translate one filter. Unknown fields yield an always-false condition.
pub fn filter_to_condition<E>(f: &FieldFilter, fmap: &FieldMap<E>) -> QueryBuildResult<Condition>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let Some(field) = fmap.get(&f.field) else {
        tracing::debug!(field = %f.field, "filter on unknown field matches nothing");
        return Ok(Condition::all().add(Expr::cust("1=0")));
    };

    let v = coerce(&f.field, field.kind, &f.value)?;
    let col = field.col;
    let e = match f.op {
        CompareOperator::Eq => Expr::col(col).eq(v),
        CompareOperator::Gt => Expr::col(col).gt(v),
        CompareOperator::Ge => Expr::col(col).gte(v),
        CompareOperator::Lt => Expr::col(col).lt(v),
        CompareOperator::Le => Expr::col(col).lte(v),
    };
    Ok(Condition::all().add(e))
}

/* ---------- query features ---------- */

/// Per-request query builder state: the `Select` being refined plus the
/// parsed query it is refined from.
pub struct QueryFeatures<'q, E: EntityTrait> {
    select: Select<E>,
    query: &'q ListQuery,
    fmap: &'q FieldMap<E>,
    fields: FieldSelection,
    page: Option<PageRequest>,
}

impl<'q, E> QueryFeatures<'q, E>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    pub fn new(select: Select<E>, query: &'q ListQuery, fmap: &'q FieldMap<E>) -> Self {
        Self {
            select,
            query,
            fmap,
            fields: FieldSelection::all(),
            page: None,
        }
    }

    /// AND together every field filter of the query.
    pub fn filter(mut self) -> QueryBuildResult<Self> {
        if self.query.filters.is_empty() {
            return Ok(self);
        }
        let mut cond = Condition::all();
        for f in &self.query.filters {
            cond = cond.add(filter_to_condition(f, self.fmap)?);
        }
        self.select = self.select.filter(cond);
        Ok(self)
    }

    /// Order by the requested keys, or `default_order` when none were given.
    /// Unknown keys are skipped; `tiebreaker` always closes the order.
    pub fn sort(mut self, default_order: &OrderBy, tiebreaker: (&str, SortDir)) -> Self {
        let order = if self.query.order.is_empty() {
            default_order.clone()
        } else {
            self.query.order.clone()
        };
        let order = order.ensure_tiebreaker(tiebreaker.0, tiebreaker.1);

        for key in order.keys() {
            let Some(field) = self.fmap.get(&key.field) else {
                tracing::debug!(field = %key.field, "ignoring sort on unknown field");
                continue;
            };
            let dir = match key.dir {
                SortDir::Asc => Order::Asc,
                SortDir::Desc => Order::Desc,
            };
            self.select = self.select.order_by(field.col, dir);
        }
        self
    }

    /// Record the projection allow-list.
    pub fn limit_fields(mut self) -> Self {
        self.fields = self.query.fields.clone();
        self
    }

    /// Apply `OFFSET (page-1)*limit LIMIT limit`.
    pub fn paginate(mut self, cfg: LimitCfg) -> Self {
        let page = PageRequest::resolve(self.query.page, self.query.limit, cfg);
        self.select = self.select.offset(page.offset()).limit(page.limit);
        self.page = Some(page);
        self
    }

    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }

    pub fn into_parts(self) -> (Select<E>, FieldSelection) {
        (self.select, self.fields)
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod query_tests;

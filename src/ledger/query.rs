//! Listing query options: filters, sort, projection, pagination.
//!
//! The WHERE clause is assembled as numbered-placeholder fragments with a
//! parallel list of bind values, so the same clause serves both the COUNT
//! query and the page query.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Caller-supplied listing options. All fields optional; an empty query
/// lists everything in insertion order, first page.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListQuery {
    /// Free-text search over note and type (case-insensitive substring)
    pub search: Option<String>,
    /// Exact type filter; "all" means no filter
    pub txn_type: Option<String>,
    /// Exact status filter
    pub status: Option<String>,
    /// Party filter (sender or receiver); subject to history scoping
    pub user_id: Option<Uuid>,
    /// Inclusive creation-date range, interpreted as whole UTC days
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Inclusive amount range
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    /// Sort key, optionally prefixed with '-' for descending
    /// (e.g. "-created_at"). Unknown keys fall back to insertion order.
    pub sort: Option<String>,
    /// Comma-separated field projection (e.g. "txn_id,amount,status")
    pub fields: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Pagination metadata returned alongside every listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListMeta {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl ListMeta {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let total_pages = (total + limit as i64 - 1) / limit as i64;
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Clamp page/limit to sane values; returns (page, limit, offset).
pub(crate) fn normalize_page(page: Option<u32>, limit: Option<u32>) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = (page as i64 - 1) * limit as i64;
    (page, limit, offset)
}

/// A bind value queued for positional binding.
#[derive(Debug, Clone)]
pub(crate) enum Bind {
    Uuid(Uuid),
    Text(String),
    Amount(Decimal),
    Ts(DateTime<Utc>),
}

/// WHERE fragment plus its bind values, placeholders numbered from $1.
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    conds: Vec<String>,
    pub binds: Vec<Bind>,
}

impl WhereClause {
    fn push_bind(&mut self, bind: Bind) -> usize {
        self.binds.push(bind);
        self.binds.len()
    }

    /// Render as " WHERE ..." or an empty string when unfiltered.
    pub fn sql(&self) -> String {
        if self.conds.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conds.join(" AND "))
        }
    }

    /// Placeholder index for the next bind appended after the clause
    /// (LIMIT/OFFSET in the page query).
    pub fn next_placeholder(&self) -> usize {
        self.binds.len() + 1
    }
}

/// Build the ledger WHERE clause from the effective party scope and the
/// caller's filters. `user_filter` is the scope already resolved by policy,
/// not the raw request value.
pub(crate) fn build_where(user_filter: Option<Uuid>, q: &ListQuery) -> WhereClause {
    let mut w = WhereClause::default();

    if let Some(uid) = user_filter {
        let a = w.push_bind(Bind::Uuid(uid));
        let b = w.push_bind(Bind::Uuid(uid));
        w.conds
            .push(format!("(sender_id = ${a} OR receiver_id = ${b})"));
    }

    if let Some(term) = q.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term);
        let a = w.push_bind(Bind::Text(pattern.clone()));
        let b = w.push_bind(Bind::Text(pattern));
        w.conds
            .push(format!("(note ILIKE ${a} OR txn_type ILIKE ${b})"));
    }

    if let Some(t) = q.txn_type.as_deref().filter(|t| !t.is_empty() && *t != "all") {
        let n = w.push_bind(Bind::Text(t.to_string()));
        w.conds.push(format!("txn_type = ${n}"));
    }

    if let Some(s) = q.status.as_deref().filter(|s| !s.is_empty()) {
        let n = w.push_bind(Bind::Text(s.to_string()));
        w.conds.push(format!("status = ${n}"));
    }

    if let Some(from) = q.date_from {
        // start of day, UTC
        let start = from.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let n = w.push_bind(Bind::Ts(start));
        w.conds.push(format!("created_at >= ${n}"));
    }

    if let Some(to) = q.date_to {
        // end of day, UTC
        let end = to.and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc();
        let n = w.push_bind(Bind::Ts(end));
        w.conds.push(format!("created_at <= ${n}"));
    }

    if let Some(min) = q.min_amount {
        let n = w.push_bind(Bind::Amount(min));
        w.conds.push(format!("amount >= ${n}"));
    }

    if let Some(max) = q.max_amount {
        let n = w.push_bind(Bind::Amount(max));
        w.conds.push(format!("amount <= ${n}"));
    }

    w
}

const SORTABLE_COLUMNS: &[&str] = &["created_at", "updated_at", "amount", "status", "txn_type"];

/// Resolve the ORDER BY clause from a whitelisted sort key.
/// Default is insertion order.
pub(crate) fn order_clause(sort: Option<&str>) -> String {
    if let Some(raw) = sort {
        let (key, dir) = match raw.strip_prefix('-') {
            Some(rest) => (rest, "DESC"),
            None => (raw, "ASC"),
        };
        if SORTABLE_COLUMNS.contains(&key) {
            return format!(" ORDER BY {key} {dir}, txn_id ASC");
        }
    }
    " ORDER BY txn_id ASC".to_string()
}

/// Apply a comma-separated field projection to a serialized row.
pub(crate) fn project_fields(row: Value, fields: &str) -> Value {
    let keep: Vec<&str> = fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if keep.is_empty() {
        return row;
    }
    match row {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| keep.contains(&k.as_str()))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query_has_no_where() {
        let w = build_where(None, &ListQuery::default());
        assert_eq!(w.sql(), "");
        assert!(w.binds.is_empty());
        assert_eq!(w.next_placeholder(), 1);
    }

    #[test]
    fn test_scope_filter_binds_both_sides() {
        let uid = Uuid::new_v4();
        let w = build_where(Some(uid), &ListQuery::default());
        assert_eq!(w.sql(), " WHERE (sender_id = $1 OR receiver_id = $2)");
        assert_eq!(w.binds.len(), 2);
    }

    #[test]
    fn test_placeholders_are_sequential() {
        let uid = Uuid::new_v4();
        let q = ListQuery {
            search: Some("top-up".into()),
            txn_type: Some("DEPOSIT".into()),
            status: Some("COMPLETED".into()),
            min_amount: Some(Decimal::from(10)),
            max_amount: Some(Decimal::from(100)),
            ..Default::default()
        };
        let w = build_where(Some(uid), &q);
        assert_eq!(
            w.sql(),
            " WHERE (sender_id = $1 OR receiver_id = $2) \
             AND (note ILIKE $3 OR txn_type ILIKE $4) \
             AND txn_type = $5 AND status = $6 \
             AND amount >= $7 AND amount <= $8"
        );
        assert_eq!(w.binds.len(), 8);
        assert_eq!(w.next_placeholder(), 9);
    }

    #[test]
    fn test_type_filter_all_is_no_filter() {
        let q = ListQuery {
            txn_type: Some("all".into()),
            ..Default::default()
        };
        let w = build_where(None, &q);
        assert_eq!(w.sql(), "");
    }

    #[test]
    fn test_date_range_covers_whole_days() {
        let q = ListQuery {
            date_from: Some(NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()),
            ..Default::default()
        };
        let w = build_where(None, &q);
        assert_eq!(w.sql(), " WHERE created_at >= $1 AND created_at <= $2");
        match (&w.binds[0], &w.binds[1]) {
            (Bind::Ts(start), Bind::Ts(end)) => {
                assert_eq!(start.to_rfc3339(), "2025-08-22T00:00:00+00:00");
                assert!(end > start);
            }
            other => panic!("unexpected binds: {:?}", other),
        }
    }

    #[test]
    fn test_order_clause_whitelist() {
        assert_eq!(order_clause(None), " ORDER BY txn_id ASC");
        assert_eq!(
            order_clause(Some("-created_at")),
            " ORDER BY created_at DESC, txn_id ASC"
        );
        assert_eq!(order_clause(Some("amount")), " ORDER BY amount ASC, txn_id ASC");
        // unknown or hostile keys fall back to insertion order
        assert_eq!(order_clause(Some("balance; DROP TABLE")), " ORDER BY txn_id ASC");
    }

    #[test]
    fn test_normalize_page_clamps() {
        assert_eq!(normalize_page(None, None), (1, DEFAULT_PAGE_LIMIT, 0));
        assert_eq!(normalize_page(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(normalize_page(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(normalize_page(Some(1), Some(10_000)), (1, MAX_PAGE_LIMIT, 0));
    }

    #[test]
    fn test_meta_total_pages() {
        assert_eq!(ListMeta::new(1, 10, 0).total_pages, 0);
        assert_eq!(ListMeta::new(1, 10, 10).total_pages, 1);
        assert_eq!(ListMeta::new(1, 10, 11).total_pages, 2);
    }

    #[test]
    fn test_project_fields_keeps_requested_keys() {
        let row = json!({"txn_id": 1, "amount": "40", "status": "COMPLETED", "note": "x"});
        let out = project_fields(row, "txn_id, amount");
        assert_eq!(out, json!({"txn_id": 1, "amount": "40"}));
    }

    #[test]
    fn test_project_fields_empty_list_is_identity() {
        let row = json!({"txn_id": 1});
        assert_eq!(project_fields(row.clone(), " , "), row);
    }
}

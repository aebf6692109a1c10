//! Translation of [`Query`] and [`Filter`] values into PostgREST query
//! parameters.
//!
//! | Concept | Parameter |
//! |---------|-----------|
//! | column list | `select=a,b` (`*` when empty) |
//! | `Op::Eq` | `col=eq.v` (`col=is.null` for null) |
//! | `Op::Neq` | `col=not.eq.v` (`col=not.is.null` for null) |
//! | `Op::Gte` | `col=gte.v` |
//! | order | `order=col.asc` / `order=col.desc` |
//! | limit | `limit=n` |

use portal_core::{
  Row,
  table::{Direction, Filter, Op, Query},
};
use serde_json::Value;

pub(crate) type Params = Vec<(String, String)>;

/// Render a filter operand the way PostgREST expects it in a URL.
fn operand(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn filter_param(filter: &Filter) -> (String, String) {
  let condition = match (filter.op, &filter.value) {
    (Op::Eq, Value::Null) => "is.null".to_owned(),
    (Op::Neq, Value::Null) => "not.is.null".to_owned(),
    (Op::Eq, v) => format!("eq.{}", operand(v)),
    (Op::Neq, v) => format!("not.eq.{}", operand(v)),
    (Op::Gte, v) => format!("gte.{}", operand(v)),
  };
  (filter.column.clone(), condition)
}

pub(crate) fn filter_params(filters: &[Filter]) -> Params {
  filters.iter().map(filter_param).collect()
}

pub(crate) fn select_params(query: &Query) -> Params {
  let columns = if query.columns.is_empty() {
    "*".to_owned()
  } else {
    query.columns.join(",")
  };

  let mut params = vec![("select".to_owned(), columns)];
  params.extend(filter_params(&query.filters));
  if let Some(order) = &query.order {
    let dir = match order.direction {
      Direction::Ascending => "asc",
      Direction::Descending => "desc",
    };
    params.push(("order".to_owned(), format!("{}.{dir}", order.column)));
  }
  if let Some(limit) = query.limit {
    params.push(("limit".to_owned(), limit.to_string()));
  }
  params
}

/// The `columns` parameter for a batch insert: the union of every row's keys,
/// so rows that omit a column get its default instead of failing.
pub(crate) fn insert_columns(rows: &[Row]) -> Option<String> {
  if rows.len() < 2 {
    return None;
  }
  let mut columns: Vec<&str> = Vec::new();
  for key in rows.iter().flat_map(|r| r.keys()) {
    if !columns.contains(&key.as_str()) {
      columns.push(key);
    }
  }
  Some(columns.join(","))
}

/// The total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub(crate) fn content_range_total(header: &str) -> Option<u64> {
  header.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn pairs(params: &Params) -> Vec<(&str, &str)> {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
  }

  #[test]
  fn select_with_filters_order_and_limit() {
    let query = Query::only(["id", "date"])
      .filter(Filter::eq("user_id", "user-1"))
      .filter(Filter::gte("date", "2025-06-01"))
      .filter(Filter::neq("status", "cancelled"))
      .order_by("date", Direction::Ascending)
      .limit(2);

    assert_eq!(
      pairs(&select_params(&query)),
      [
        ("select", "id,date"),
        ("user_id", "eq.user-1"),
        ("date", "gte.2025-06-01"),
        ("status", "not.eq.cancelled"),
        ("order", "date.asc"),
        ("limit", "2"),
      ]
    );
  }

  #[test]
  fn empty_column_list_selects_everything() {
    let query = Query::all().order_by("created_at", Direction::Descending);
    assert_eq!(
      pairs(&select_params(&query)),
      [("select", "*"), ("order", "created_at.desc")]
    );
  }

  #[test]
  fn non_string_operands() {
    let filters = [
      Filter::eq("comprehensive_analysis", true),
      Filter::eq("notes", Value::Null),
      Filter::neq("notes", Value::Null),
      Filter::gte("score", 3),
    ];
    assert_eq!(
      pairs(&filter_params(&filters)),
      [
        ("comprehensive_analysis", "eq.true"),
        ("notes", "is.null"),
        ("notes", "not.is.null"),
        ("score", "gte.3"),
      ]
    );
  }

  #[test]
  fn batch_insert_columns_are_the_key_union() {
    let row = |v: Value| v.as_object().cloned().unwrap();
    assert_eq!(insert_columns(&[row(json!({ "a": 1 }))]), None);
    let rows = [row(json!({ "a": 1, "b": 2 })), row(json!({ "a": 1, "c": 3 }))];
    assert_eq!(insert_columns(&rows).as_deref(), Some("a,b,c"));
  }

  #[test]
  fn content_range_totals() {
    assert_eq!(content_range_total("0-24/3573"), Some(3573));
    assert_eq!(content_range_total("*/0"), Some(0));
    assert_eq!(content_range_total("0-24/*"), None);
    assert_eq!(content_range_total("garbage"), None);
  }
}

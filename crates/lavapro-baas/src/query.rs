//! # Table Queries
//!
//! A small builder for the table API's query-string dialect, plus an
//! in-process matcher so the memory backend applies the same filters.
//!
//! ```text
//! Query::table("orders")
//!     .select("*,customers(name),services(name)")
//!     .eq("tenant_id", tenant)
//!     .order_by("created_at", true)
//!
//!   ──► GET /rest/v1/orders?select=*,customers(name),services(name)
//!                          &tenant_id=eq.5f0c...
//!                          &order=created_at.desc
//! ```

use serde_json::Value;

/// A single row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column IN (values)`
    In(String, Vec<Value>),
    /// `column IS NULL`
    IsNull(String),
    /// Any of the inner filters.
    Or(Vec<Filter>),
}

impl Filter {
    /// Whether a row satisfies this filter.
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => field_text(row, column)
                .map_or(false, |text| text == value_text(value)),
            Filter::In(column, values) => field_text(row, column)
                .map_or(false, |text| values.iter().any(|v| text == value_text(v))),
            Filter::IsNull(column) => row.get(column).map_or(true, Value::is_null),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(row)),
        }
    }

    /// Inner form used inside `or=(...)`.
    fn render_inner(&self) -> String {
        match self {
            Filter::Eq(column, value) => format!("{}.eq.{}", column, list_item(value)),
            Filter::In(column, values) => format!("{}.in.({})", column, list(values)),
            Filter::IsNull(column) => format!("{}.is.null", column),
            Filter::Or(filters) => format!(
                "or({})",
                filters.iter().map(Filter::render_inner).collect::<Vec<_>>().join(",")
            ),
        }
    }

    /// Top-level query parameter.
    fn render(&self) -> (String, String) {
        match self {
            Filter::Eq(column, value) => (column.clone(), format!("eq.{}", value_text(value))),
            Filter::In(column, values) => (column.clone(), format!("in.({})", list(values))),
            Filter::IsNull(column) => (column.clone(), "is.null".to_string()),
            Filter::Or(filters) => (
                "or".to_string(),
                format!(
                    "({})",
                    filters.iter().map(Filter::render_inner).collect::<Vec<_>>().join(",")
                ),
            ),
        }
    }
}

/// Sort order of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub column: String,
    pub descending: bool,
}

/// A read, update or insert target with its filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub select: String,
    pub filters: Vec<Filter>,
    pub order: Option<Ordering>,
    pub limit: Option<usize>,
}

impl Query {
    /// Starts a query selecting every column of `table`.
    pub fn table(table: &str) -> Self {
        Query {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.filters.push(Filter::Or(filters));
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Ordering {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string parameters in the table API's dialect.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filters.iter().map(Filter::render));
        if let Some(order) = &self.order {
            let direction = if order.descending { "desc" } else { "asc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Whether a row satisfies every filter.
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Embedded relations named in the select list with their columns,
    /// e.g. `*,customers(name)` → `[("customers", ["name"])]`.
    pub fn embeds(&self) -> Vec<(String, Vec<String>)> {
        split_top_level(&self.select)
            .into_iter()
            .filter_map(|item| {
                let open = item.find('(')?;
                let close = item.rfind(')')?;
                let relation = item[..open].trim().to_string();
                let columns = item[open + 1..close]
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                Some((relation, columns))
            })
            .collect()
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Comparable text of a JSON scalar.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column) {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_text(v)),
    }
}

/// A list item, double-quoted when it contains reserved characters.
fn list_item(value: &Value) -> String {
    let text = value_text(value);
    if text.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | ' ' | '.' | ':')) {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text
    }
}

fn list(values: &[Value]) -> String {
    values.iter().map(list_item).collect::<Vec<_>>().join(",")
}

fn split_top_level(select: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in select.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&select[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&select[start..]);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params() {
        let q = Query::table("orders")
            .select("*,customers(name),services(name)")
            .eq("tenant_id", "abc")
            .in_list("customer_id", [1, 2])
            .order_by("created_at", true)
            .limit(50);
        assert_eq!(
            q.to_params(),
            vec![
                ("select".to_string(), "*,customers(name),services(name)".to_string()),
                ("tenant_id".to_string(), "eq.abc".to_string()),
                ("customer_id".to_string(), "in.(1,2)".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_or_rendering() {
        let q = Query::table("services").or(vec![
            Filter::Eq("tenant_id".into(), json!("t1")),
            Filter::IsNull("tenant_id".into()),
        ]);
        assert_eq!(
            q.to_params()[1],
            ("or".to_string(), "(tenant_id.eq.t1,tenant_id.is.null)".to_string())
        );
    }

    #[test]
    fn test_in_list_quotes_reserved() {
        let q = Query::table("orders").in_list("status", ["Aguardando Coleta", "ready"]);
        assert_eq!(q.to_params()[1].1, "in.(\"Aguardando Coleta\",ready)");
    }

    #[test]
    fn test_matches_compares_scalars_as_text() {
        let row = json!({ "id": 5, "tenant_id": "t1", "profile_id": null });
        assert!(Query::table("x").eq("id", "5").matches(&row));
        assert!(Query::table("x").eq("id", 5).eq("tenant_id", "t1").matches(&row));
        assert!(!Query::table("x").eq("tenant_id", "t2").matches(&row));
        assert!(Query::table("x").in_list("id", [4, 5]).matches(&row));
        assert!(Filter::IsNull("profile_id".into()).matches(&row));
        assert!(Filter::IsNull("missing".into()).matches(&row));
        assert!(!Query::table("x").eq("profile_id", "p").matches(&row));
    }

    #[test]
    fn test_embeds() {
        let q = Query::table("orders").select("*,customers(name,phone),services(name)");
        assert_eq!(
            q.embeds(),
            vec![
                ("customers".to_string(), vec!["name".to_string(), "phone".to_string()]),
                ("services".to_string(), vec!["name".to_string()]),
            ]
        );
        assert!(Query::table("orders").embeds().is_empty());
    }
}

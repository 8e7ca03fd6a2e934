//! In-process mirror of the remote tables: a map from table name to an
//! ordered collection of rows. Serves as the fallback read source and as the
//! optimistic write target for every operation.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::trace;

use crate::store::Row;

#[derive(Default)]
pub struct LocalStore {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a table's contents. Used at startup to install sample rows.
    pub async fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut tables = self.tables.write().await;
        tables.insert(table.to_string(), rows);
    }

    pub async fn fetch_sorted(&self, table: &str, order_by: &str, ascending: bool) -> Vec<Row> {
        let tables = self.tables.read().await;
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let ord = cmp_values(
                a.get(order_by).unwrap_or(&Value::Null),
                b.get(order_by).unwrap_or(&Value::Null),
            );
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        rows
    }

    pub async fn insert_rows(&self, table: &str, rows: Vec<Row>) {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();
        trace!(table, count = rows.len(), "mirror insert");
        entry.extend(rows);
    }

    /// Applies `patch` to every row where `col == value`; returns the number
    /// of rows touched.
    pub async fn patch_where(&self, table: &str, col: &str, value: &Value, patch: &Row) -> usize {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return 0;
        };
        let mut touched = 0;
        for row in rows.iter_mut() {
            if row.get(col) == Some(value) {
                for (k, v) in patch {
                    row.insert(k.clone(), v.clone());
                }
                touched += 1;
            }
        }
        touched
    }

    pub async fn delete_where(&self, table: &str, col: &str, value: &Value) -> usize {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|row| row.get(col) != Some(value));
        before - rows.len()
    }

    /// Insert-or-replace keyed on `key_col`.
    pub async fn upsert_by(&self, table: &str, key_col: &str, row: Row) {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let key = row.get(key_col).cloned().unwrap_or(Value::Null);
        if let Some(existing) = rows.iter_mut().find(|r| r.get(key_col) == Some(&key)) {
            *existing = row;
        } else {
            rows.push(row);
        }
    }

    pub async fn get_where_single(&self, table: &str, col: &str, value: &Value) -> Option<Row> {
        let tables = self.tables.read().await;
        tables
            .get(table)?
            .iter()
            .find(|row| row.get(col) == Some(value))
            .cloned()
    }

    pub async fn count_where(&self, table: &str, col: &str, value: &Value) -> usize {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| row.get(col) == Some(value)).count())
            .unwrap_or(0)
    }

    pub async fn len(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map(Vec::len).unwrap_or(0)
    }

    pub async fn is_empty(&self, table: &str) -> bool {
        self.len(table).await == 0
    }
}

/// Ordering over heterogeneous JSON values: numbers numerically, strings
/// lexicographically, nulls last.
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(f64::NAN)
            .total_cmp(&y.as_f64().unwrap_or(f64::NAN)),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: Value) -> Row {
        let Value::Object(map) = pairs else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn fetch_sorted_orders_by_column() {
        let store = LocalStore::new();
        store
            .insert_rows(
                "t",
                vec![
                    row(json!({"id": "1", "name": "Chen"})),
                    row(json!({"id": "2", "name": "Ahn"})),
                    row(json!({"id": "3", "name": null})),
                ],
            )
            .await;

        let asc = store.fetch_sorted("t", "name", true).await;
        assert_eq!(asc[0].get("id"), Some(&json!("2")));
        assert_eq!(asc[2].get("name"), Some(&Value::Null), "nulls sort last");

        let desc = store.fetch_sorted("t", "name", false).await;
        assert_eq!(desc[0].get("name"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn patch_where_touches_only_matches() {
        let store = LocalStore::new();
        store
            .insert_rows(
                "t",
                vec![
                    row(json!({"order_number": "A", "status": "Pending"})),
                    row(json!({"order_number": "A", "status": "Pending"})),
                    row(json!({"order_number": "B", "status": "Pending"})),
                ],
            )
            .await;

        let touched = store
            .patch_where(
                "t",
                "order_number",
                &json!("A"),
                &row(json!({"status": "Completed"})),
            )
            .await;
        assert_eq!(touched, 2);

        let remaining = store.count_where("t", "status", &json!("Pending")).await;
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_key() {
        let store = LocalStore::new();
        store
            .upsert_by("kv", "key", row(json!({"key": "AdminPassword", "value": "1234"})))
            .await;
        store
            .upsert_by("kv", "key", row(json!({"key": "AdminPassword", "value": "5678"})))
            .await;

        assert_eq!(store.len("kv").await, 1);
        let stored = store
            .get_where_single("kv", "key", &json!("AdminPassword"))
            .await
            .unwrap();
        assert_eq!(stored.get("value"), Some(&json!("5678")));
    }

    #[tokio::test]
    async fn delete_where_leaves_other_groups() {
        let store = LocalStore::new();
        store
            .insert_rows(
                "t",
                vec![
                    row(json!({"order_number": "A"})),
                    row(json!({"order_number": "B"})),
                    row(json!({"order_number": "A"})),
                ],
            )
            .await;

        let removed = store.delete_where("t", "order_number", &json!("A")).await;
        assert_eq!(removed, 2);
        assert_eq!(store.len("t").await, 1);
    }
}

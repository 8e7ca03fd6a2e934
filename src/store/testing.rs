//! Scripted remote backend for exercising the sync policy without a
//! network. Failure injection is per concern: all writes, all reads, or the
//! next N insert attempts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{RemoteBackend, RemoteError, Row};

#[derive(Default)]
pub struct MockRemote {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_next_inserts: AtomicUsize,
    calls: AtomicUsize,
    next_id: AtomicUsize,
    insert_payloads: Mutex<Vec<Vec<Row>>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), rows);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_inserts(&self, n: usize) {
        self.fail_next_inserts.store(n, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn insert_payloads(&self) -> Vec<Vec<Row>> {
        self.insert_payloads.lock().unwrap().clone()
    }

    fn scripted_failure() -> RemoteError {
        RemoteError::Status {
            status: 500,
            body: "scripted failure".into(),
        }
    }
}

#[async_trait]
impl RemoteBackend for MockRemote {
    async fn select_range(
        &self,
        table: &str,
        _order_by: &str,
        _ascending: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn select_one(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<Option<Row>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|row| row.get(col) == Some(value)))
            .cloned())
    }

    async fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.insert_payloads.lock().unwrap().push(rows.to_vec());

        let pending_failures = self.fail_next_inserts.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.fail_next_inserts
                .store(pending_failures - 1, Ordering::SeqCst);
            return Err(Self::scripted_failure());
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }

        let mut stored = Vec::with_capacity(rows.len());
        let mut tables = self.tables.lock().unwrap();
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            let mut row = row.clone();
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            row.insert("id".into(), Value::String(format!("srv-{}", id)));
            entry.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn update_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
        patch: &Row,
    ) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if row.get(col) == Some(value) {
                    for (k, v) in patch {
                        row.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| row.get(col) != Some(value));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, conflict_col: &str, row: &Row) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let key = row.get(conflict_col).cloned().unwrap_or(Value::Null);
        if let Some(existing) = rows
            .iter_mut()
            .find(|r| r.get(conflict_col) == Some(&key))
        {
            *existing = row.clone();
        } else {
            rows.push(row.clone());
        }
        Ok(())
    }

    async fn count_where(
        &self,
        table: &str,
        col: &str,
        value: &Value,
    ) -> Result<u64, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::scripted_failure());
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| row.get(col) == Some(value)).count() as u64)
            .unwrap_or(0))
    }
}

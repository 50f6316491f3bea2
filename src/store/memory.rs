use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{validate_identifier, RecordStore, StoreError, TrashedScope};
use crate::model::{keys_match, Record, SoftDeleteState};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Record>,
}

/// Process-local store used by tests and the demo server
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table regardless of soft-delete state
    pub async fn count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    async fn update<F>(&self, table: &str, id: i64, apply: F) -> Result<Record, StoreError>
    where
        F: FnOnce(&mut Record),
    {
        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut(table)
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", table, id)))?;
        apply(record);
        record
            .attributes
            .insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        Ok(record.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, table: &str, id: i64, scope: TrashedScope) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|t| t.rows.get(&id))
            .filter(|r| scope.admits(r))
            .cloned())
    }

    async fn find_by(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        scope: TrashedScope,
    ) -> Result<Vec<Record>, StoreError> {
        validate_identifier(column)?;
        let tables = self.tables.read().await;
        let Some(t) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(t.rows
            .values()
            .filter(|r| scope.admits(r))
            .filter(|r| r.key_value(column).map(|v| keys_match(&v, value)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        table: &str,
        mut attributes: Map<String, Value>,
        deletion: Option<SoftDeleteState>,
    ) -> Result<Record, StoreError> {
        validate_identifier(table)?;
        let now = Value::String(Utc::now().to_rfc3339());
        attributes.entry("created_at").or_insert_with(|| now.clone());
        attributes.entry("updated_at").or_insert(now);

        let mut tables = self.tables.write().await;
        let t = tables.entry(table.to_string()).or_default();

        let id = match attributes.remove("id").and_then(|v| v.as_i64()) {
            Some(explicit) => explicit,
            None => t.next_id + 1,
        };
        if t.rows.contains_key(&id) {
            return Err(StoreError::QueryError(format!("duplicate id {} in {}", id, table)));
        }
        t.next_id = t.next_id.max(id);

        let record = Record { id, attributes, deletion };
        t.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn restore(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        self.update(table, id, |r| {
            if r.deletion.is_some() {
                r.deletion = Some(SoftDeleteState::Active);
            }
        })
        .await
    }

    async fn trash(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        self.update(table, id, |r| {
            if r.deletion.is_some() {
                r.deletion = Some(SoftDeleteState::Trashed { since: Utc::now() });
            }
        })
        .await
    }

    async fn force_delete(&self, table: &str, id: i64) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .get_mut(table)
            .and_then(|t| t.rows.remove(&id))
            .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", table, id)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! In-process storage. Tables are created on first use; rows keep insertion order.

use crate::error::StorageError;
use crate::model::{is_unset_id, ColumnKind, ModelDescriptor};
use crate::storage::{id_to_string, Storage};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Table {
    rows: Vec<Value>,
    last_id: i64,
}

impl Table {
    /// Integer keys compare numerically, so `01` addresses record 1.
    fn position(&self, model: &ModelDescriptor, id: &str) -> Option<usize> {
        match model.id_kind() {
            ColumnKind::Integer => {
                let wanted = id.trim().parse::<i64>().ok()?;
                self.rows
                    .iter()
                    .position(|r| model.id_of(r).and_then(Value::as_i64) == Some(wanted))
            }
            _ => self
                .rows
                .iter()
                .position(|r| model.id_of(r).and_then(id_to_string).as_deref() == Some(id)),
        }
    }

    fn assign_id(&mut self, model: &ModelDescriptor, record: &mut Value) {
        let id = match model.id_kind() {
            ColumnKind::Text => Value::String(uuid::Uuid::new_v4().to_string()),
            _ => {
                self.last_id += 1;
                Value::from(self.last_id)
            }
        };
        model.set_id(record, id);
    }

    fn track(&mut self, model: &ModelDescriptor, record: &Value) {
        if let Some(n) = model.id_of(record).and_then(Value::as_i64) {
            self.last_id = self.last_id.max(n);
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Backend("memory storage lock poisoned".into())
}

fn record_id(model: &ModelDescriptor, record: &Value) -> Result<String, StorageError> {
    model
        .id_of(record)
        .filter(|id| !is_unset_id(Some(id)))
        .and_then(id_to_string)
        .ok_or_else(|| StorageError::InvalidRecord(format!("missing '{}'", model.id_field())))
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_one(&self, model: &ModelDescriptor, id: &str) -> Result<Value, StorageError> {
        let tables = self.tables.read().map_err(poisoned)?;
        tables
            .get(model.table())
            .and_then(|t| t.position(model, id).map(|i| t.rows[i].clone()))
            .ok_or(StorageError::NotFound)
    }

    async fn find_all(&self, model: &ModelDescriptor) -> Result<Vec<Value>, StorageError> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.get(model.table()).map(|t| t.rows.clone()).unwrap_or_default())
    }

    async fn create(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError> {
        let mut record = model.complete(record)?;
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.entry(model.table().to_string()).or_default();
        if is_unset_id(model.id_of(&record)) {
            table.assign_id(model, &mut record);
        } else {
            let id = record_id(model, &record)?;
            if table.position(model, &id).is_some() {
                return Err(StorageError::Backend(format!("duplicate identifier {}", id)));
            }
            table.track(model, &record);
        }
        tracing::debug!(table = model.table(), record = %record, "memory insert");
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn save(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError> {
        let record = model.complete(record)?;
        let id = record_id(model, &record)?;
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.entry(model.table().to_string()).or_default();
        match table.position(model, &id) {
            Some(i) => table.rows[i] = record.clone(),
            None => {
                table.track(model, &record);
                table.rows.push(record.clone());
            }
        }
        tracing::debug!(table = model.table(), record = %record, "memory save");
        Ok(record)
    }

    async fn delete(&self, model: &ModelDescriptor, record: &Value) -> Result<(), StorageError> {
        let id = record_id(model, record)?;
        let mut tables = self.tables.write().map_err(poisoned)?;
        let table = tables.get_mut(model.table()).ok_or(StorageError::NotFound)?;
        let i = table.position(model, &id).ok_or(StorageError::NotFound)?;
        table.rows.remove(i);
        tracing::debug!(table = model.table(), id = %id, "memory delete");
        Ok(())
    }
}

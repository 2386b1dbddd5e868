//! Narrow CRUD capability the default provider and processor are built on.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::{ensure_database_exists, PgStorage};

use crate::error::StorageError;
use crate::model::ModelDescriptor;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Connection pool counters reported by the readiness route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub open_connections: u32,
    pub in_use: u32,
    pub idle: u32,
    pub max_connections: u32,
}

/// Record storage keyed by model. Records are JSON renderings of the model;
/// implementations return them in the model's own shape.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Single record by identifier. `StorageError::NotFound` when nothing matches.
    async fn find_one(&self, model: &ModelDescriptor, id: &str) -> Result<Value, StorageError>;

    /// All records, ordered by identifier.
    async fn find_all(&self, model: &ModelDescriptor) -> Result<Vec<Value>, StorageError>;

    /// Insert a new record. An unset identifier is assigned by storage.
    async fn create(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError>;

    /// Insert or replace the record with the same identifier.
    async fn save(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError>;

    async fn delete(&self, model: &ModelDescriptor, record: &Value) -> Result<(), StorageError>;

    /// Create whatever backing structures the models need.
    async fn migrate(&self, _models: &[ModelDescriptor]) -> Result<(), StorageError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Pool counters, for backends that pool connections.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }

    /// Release connections. Called once the server has stopped.
    async fn close(&self) {}
}

/// Render an identifier the way it appears in a path segment.
pub(crate) fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

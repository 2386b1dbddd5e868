//! PostgreSQL storage over a shared `PgPool`.

use crate::error::StorageError;
use crate::migration::auto_migrate;
use crate::model::{is_unset_id, ColumnKind, ModelDescriptor};
use crate::sql::{self, bind_all, QueryBuf};
use crate::storage::{PoolStats, Storage};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Column, ConnectOptions, PgPool, Row, TypeInfo};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    /// Create the database when missing, then open a pool to it.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        ensure_database_exists(database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        tracing::info!(max_connections, "database connection pool configured");
        Ok(PgStorage { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_optional(&self, model: &ModelDescriptor, q: &QueryBuf) -> Result<Option<Value>, StorageError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| model.normalize(row_to_json(&r)))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn fetch_all(&self, model: &ModelDescriptor, q: &QueryBuf) -> Result<Vec<Value>, StorageError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| model.normalize(row_to_json(r)).map_err(StorageError::from))
            .collect()
    }
}

/// Path ids arrive as text; integer keys that do not parse cannot match any row.
fn parse_id(model: &ModelDescriptor, id: &str) -> Option<Value> {
    match model.id_kind() {
        ColumnKind::Integer => id.parse::<i64>().ok().map(Value::from),
        _ => Some(Value::String(id.to_string())),
    }
}

fn record_id(model: &ModelDescriptor, record: &Value) -> Result<Value, StorageError> {
    model
        .id_of(record)
        .filter(|id| !is_unset_id(Some(id)))
        .cloned()
        .ok_or_else(|| StorageError::InvalidRecord(format!("missing '{}'", model.id_field())))
}

#[async_trait]
impl Storage for PgStorage {
    async fn find_one(&self, model: &ModelDescriptor, id: &str) -> Result<Value, StorageError> {
        let id = parse_id(model, id).ok_or(StorageError::NotFound)?;
        let q = sql::select_by_id(model, id);
        self.fetch_optional(model, &q).await?.ok_or(StorageError::NotFound)
    }

    async fn find_all(&self, model: &ModelDescriptor) -> Result<Vec<Value>, StorageError> {
        self.fetch_all(model, &sql::select_all(model)).await
    }

    async fn create(&self, model: &ModelDescriptor, mut record: Value) -> Result<Value, StorageError> {
        if model.id_kind() == ColumnKind::Text && is_unset_id(model.id_of(&record)) {
            model.set_id(&mut record, Value::String(uuid::Uuid::new_v4().to_string()));
        }
        let q = sql::insert(model, &record);
        self.fetch_optional(model, &q)
            .await?
            .ok_or_else(|| StorageError::Backend("insert returned no row".into()))
    }

    async fn save(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError> {
        record_id(model, &record)?;
        let q = sql::upsert(model, &record);
        match self.fetch_optional(model, &q).await? {
            Some(row) => Ok(row),
            // ON CONFLICT DO NOTHING (identifier-only models) returns no row.
            None => Ok(record),
        }
    }

    async fn delete(&self, model: &ModelDescriptor, record: &Value) -> Result<(), StorageError> {
        let q = sql::delete(model, record_id(model, record)?);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let removed = bind_all(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        removed.map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn migrate(&self, models: &[ModelDescriptor]) -> Result<(), StorageError> {
        auto_migrate(&self.pool, models).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        let open = self.pool.size();
        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        Some(PoolStats {
            open_connections: open,
            in_use: open.saturating_sub(idle),
            idle,
            max_connections: self.pool.options().get_max_connections(),
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database connection pool closed");
    }
}

fn row_to_json(row: &PgRow) -> Value {
    let mut map = serde_json::Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i, col.type_info().name()));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, i: usize, pg_type: &str) -> Value {
    let value = match pg_type {
        "INT2" => row.try_get::<Option<i16>, _>(i).ok().flatten().map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(i).ok().flatten().map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(i).ok().flatten().map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(i).ok().flatten().map(|n| Value::from(n as f64)),
        "FLOAT8" => row.try_get::<Option<f64>, _>(i).ok().flatten().map(Value::from),
        "BOOL" => row.try_get::<Option<bool>, _>(i).ok().flatten().map(Value::Bool),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(i)
            .ok()
            .flatten()
            .map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(i)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(i).ok().flatten(),
        _ => row.try_get::<Option<String>, _>(i).ok().flatten().map(Value::String),
    };
    value.unwrap_or(Value::Null)
}

/// Connects to the server's `postgres` database and creates the target
/// database when it does not exist yet.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StorageError> {
    let (admin_url, db_name) = split_database_url(database_url);
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url)?;
    let mut conn = opts.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split "postgres://host/db?opts" into ("postgres://host/postgres?opts", "db").
fn split_database_url(url: &str) -> (String, String) {
    let Some(slash) = url.rfind('/') else {
        return (url.to_string(), String::new());
    };
    let (base, rest) = url.split_at(slash + 1);
    let (db_name, query) = match rest.split_once('?') {
        Some((name, q)) => (name, format!("?{}", q)),
        None => (rest, String::new()),
    };
    (format!("{}postgres{}", base, query), db_name.trim().to_string())
}

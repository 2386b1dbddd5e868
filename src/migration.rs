//! Auto-migration: create each model's table and add columns it is missing.
//! Existing columns are never altered or dropped.

use crate::error::StorageError;
use crate::model::{ColumnKind, ModelDescriptor};
use crate::sql::quoted;
use sqlx::PgPool;

/// CREATE TABLE IF NOT EXISTS for one model. Integer identifiers become
/// `BIGSERIAL PRIMARY KEY`; any other identifier kind is a plain primary key.
pub fn create_table_sql(model: &ModelDescriptor) -> String {
    let col_defs: Vec<String> = model
        .columns()
        .iter()
        .map(|c| {
            if c.name == model.id_field() {
                let typ = match c.kind {
                    ColumnKind::Integer => "BIGSERIAL",
                    other => other.pg_type(),
                };
                format!("{} {} PRIMARY KEY", quoted(&c.name), typ)
            } else {
                format!("{} {}", quoted(&c.name), c.kind.pg_type())
            }
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(model.table()),
        col_defs.join(",\n  ")
    )
}

/// ALTER TABLE .. ADD COLUMN IF NOT EXISTS for every non-identifier column.
pub fn add_columns_sql(model: &ModelDescriptor) -> Vec<String> {
    model
        .columns()
        .iter()
        .filter(|c| c.name != model.id_field())
        .map(|c| {
            format!(
                "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {} {}",
                quoted(model.table()),
                quoted(&c.name),
                c.kind.pg_type()
            )
        })
        .collect()
}

pub async fn auto_migrate(pool: &PgPool, models: &[ModelDescriptor]) -> Result<(), StorageError> {
    tracing::info!(models = models.len(), "starting database auto-migration");
    for model in models {
        if !model.is_struct_shaped() {
            return Err(StorageError::InvalidRecord(format!(
                "{} does not serialize to a record",
                model.name()
            )));
        }
        tracing::debug!(model = model.name(), table = model.table(), "migrating model schema");
        sqlx::query(&create_table_sql(model)).execute(pool).await?;
        for sql in add_columns_sql(model) {
            sqlx::query(&sql).execute(pool).await?;
        }
    }
    tracing::info!("database migration completed");
    Ok(())
}

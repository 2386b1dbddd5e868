//! Builds parameterized SELECT, INSERT, upsert and DELETE statements from a model descriptor.

use crate::model::{is_unset_id, Column, ColumnKind, ModelDescriptor};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from model descriptors).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub kind: ColumnKind,
    pub value: Value,
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Param>,
}

impl QueryBuf {
    fn push_param(&mut self, kind: ColumnKind, value: Value) -> usize {
        self.params.push(Param { kind, value });
        self.params.len()
    }
}

fn column_list(columns: &[Column]) -> String {
    columns.iter().map(|c| quoted(&c.name)).collect::<Vec<_>>().join(", ")
}

/// SELECT all rows ordered by identifier.
pub fn select_all(model: &ModelDescriptor) -> QueryBuf {
    QueryBuf {
        sql: format!(
            "SELECT {} FROM {} ORDER BY {}",
            column_list(&model.columns()),
            quoted(model.table()),
            quoted(model.id_field())
        ),
        params: Vec::new(),
    }
}

/// SELECT by identifier. The id is the sole param.
pub fn select_by_id(model: &ModelDescriptor, id: Value) -> QueryBuf {
    let mut q = QueryBuf::default();
    let n = q.push_param(model.id_kind(), id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        column_list(&model.columns()),
        quoted(model.table()),
        quoted(model.id_field()),
        n
    );
    q
}

/// INSERT one record. An unset identifier is left out so the database assigns it.
pub fn insert(model: &ModelDescriptor, record: &Value) -> QueryBuf {
    let mut q = QueryBuf::default();
    let columns = model.columns();
    let skip_id = is_unset_id(model.id_of(record));
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &columns {
        if skip_id && c.name == model.id_field() {
            continue;
        }
        let value = record.get(&c.name).cloned().unwrap_or(Value::Null);
        let n = q.push_param(c.kind, value);
        cols.push(quoted(&c.name));
        placeholders.push(format!("${}", n));
    }
    let table = quoted(model.table());
    let returning = column_list(&columns);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// INSERT .. ON CONFLICT (id) DO UPDATE: replaces every column of the record
/// with the same identifier, or inserts it.
pub fn upsert(model: &ModelDescriptor, record: &Value) -> QueryBuf {
    let mut q = QueryBuf::default();
    let columns = model.columns();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    let mut sets = Vec::new();
    for c in &columns {
        let value = record.get(&c.name).cloned().unwrap_or(Value::Null);
        let n = q.push_param(c.kind, value);
        cols.push(quoted(&c.name));
        placeholders.push(format!("${}", n));
        if c.name != model.id_field() {
            sets.push(format!("{0} = EXCLUDED.{0}", quoted(&c.name)));
        }
    }
    let id = quoted(model.id_field());
    let on_conflict = if sets.is_empty() {
        format!("ON CONFLICT ({}) DO NOTHING", id)
    } else {
        format!("ON CONFLICT ({}) DO UPDATE SET {}", id, sets.join(", "))
    };
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) {} RETURNING {}",
        quoted(model.table()),
        cols.join(", "),
        placeholders.join(", "),
        on_conflict,
        column_list(&columns)
    );
    q
}

/// DELETE by identifier, returning the id of the removed row.
pub fn delete(model: &ModelDescriptor, id: Value) -> QueryBuf {
    let mut q = QueryBuf::default();
    let n = q.push_param(model.id_kind(), id);
    let id_col = quoted(model.id_field());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        quoted(model.table()),
        id_col,
        n,
        id_col
    );
    q
}

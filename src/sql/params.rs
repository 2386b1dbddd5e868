//! Bind serde_json values to PostgreSQL queries, typed by the target column.

use crate::model::ColumnKind;
use crate::sql::Param;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Bind one parameter. Nulls are typed after the column; JSON columns always
/// receive the value as JSONB.
pub fn bind_param<'q>(query: PgQuery<'q>, param: &Param) -> PgQuery<'q> {
    match (param.kind, &param.value) {
        (ColumnKind::Integer, Value::Null) => query.bind(None::<i64>),
        (ColumnKind::Float, Value::Null) => query.bind(None::<f64>),
        (ColumnKind::Bool, Value::Null) => query.bind(None::<bool>),
        (ColumnKind::Text, Value::Null) => query.bind(None::<String>),
        (ColumnKind::Json, Value::Null) => query.bind(None::<Json<Value>>),
        (ColumnKind::Json, v) => query.bind(Json(v.clone())),
        (_, Value::Bool(b)) => query.bind(*b),
        (_, Value::Number(n)) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64().unwrap_or_default()),
        },
        (_, Value::String(s)) => query.bind(s.clone()),
        (_, v) => query.bind(Json(v.clone())),
    }
}

pub fn bind_all<'q>(mut query: PgQuery<'q>, params: &[Param]) -> PgQuery<'q> {
    for p in params {
        query = bind_param(query, p);
    }
    query
}

//! Model contract and the type-erased descriptor handed to the request pipeline.
//!
//! Records travel through providers, processors and storage as JSON values. The
//! descriptor keeps the few typed capabilities the pipeline needs: a zero-valued
//! instance, a decoder that round-trips a value through the concrete type, and
//! the name of the identifier field.

use crate::case;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A caller-defined record type that can be exposed as a REST resource.
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct Book { id: u64, title: String }
///
/// impl Model for Book {}
/// ```
pub trait Model: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Name of the identifier field as it appears in the serialized record.
    const ID_FIELD: &'static str = "id";

    /// Short type name used to derive the resource path.
    fn type_name() -> &'static str {
        case::short_type_name(std::any::type_name::<Self>())
    }

    fn table_name() -> String {
        case::table_name(Self::type_name())
    }

    fn descriptor() -> ModelDescriptor
    where
        Self: Sized,
    {
        ModelDescriptor::of::<Self>()
    }
}

/// Storage type of a column, inferred from the zero-valued instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
    Json,
}

impl ColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Number(n) if n.is_f64() => ColumnKind::Float,
            Value::Number(_) => ColumnKind::Integer,
            Value::Bool(_) => ColumnKind::Bool,
            Value::String(_) => ColumnKind::Text,
            Value::Null | Value::Array(_) | Value::Object(_) => ColumnKind::Json,
        }
    }

    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "BIGINT",
            ColumnKind::Float => "DOUBLE PRECISION",
            ColumnKind::Bool => "BOOLEAN",
            ColumnKind::Text => "TEXT",
            ColumnKind::Json => "JSONB",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Runtime description of a [`Model`].
#[derive(Clone)]
pub struct ModelDescriptor {
    name: &'static str,
    table: String,
    id_field: &'static str,
    blank: Value,
    normalize: fn(Value) -> Result<Value, serde_json::Error>,
}

fn normalize<M: Model>(value: Value) -> Result<Value, serde_json::Error> {
    let record: M = serde_json::from_value(value)?;
    serde_json::to_value(record)
}

impl ModelDescriptor {
    pub fn of<M: Model>() -> Self {
        ModelDescriptor {
            name: M::type_name(),
            table: M::table_name(),
            id_field: M::ID_FIELD,
            blank: serde_json::to_value(M::default()).unwrap_or(Value::Null),
            normalize: normalize::<M>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id_field(&self) -> &'static str {
        self.id_field
    }

    /// Default resource path, e.g. `/books`.
    pub fn resource_path(&self) -> String {
        case::resource_path(self.name)
    }

    /// Only record-shaped models (serializing to a JSON object) can back a resource.
    pub fn is_struct_shaped(&self) -> bool {
        self.blank.is_object()
    }

    /// A new zero-valued instance.
    pub fn blank(&self) -> Value {
        self.blank.clone()
    }

    /// Round-trip a value through the concrete model type.
    pub fn normalize(&self, value: Value) -> Result<Value, serde_json::Error> {
        (self.normalize)(value)
    }

    /// Decode a request body into a new instance: fields absent from the body
    /// keep their zero value.
    pub fn decode_body(&self, body: &[u8]) -> Result<Value, serde_json::Error> {
        let patch: Map<String, Value> = serde_json::from_slice(body)?;
        self.complete(Value::Object(patch))
    }

    /// Fill the fields missing from `partial` with zero values, then normalize.
    pub fn complete(&self, partial: Value) -> Result<Value, serde_json::Error> {
        let record = match (self.blank(), partial) {
            (Value::Object(mut fields), Value::Object(patch)) => {
                fields.extend(patch);
                Value::Object(fields)
            }
            (_, other) => other,
        };
        self.normalize(record)
    }

    pub fn id_of<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record.get(self.id_field)
    }

    /// Overwrite the identifier of `record`. No-op for non-object values.
    pub fn set_id(&self, record: &mut Value, id: Value) {
        if let Value::Object(fields) = record {
            fields.insert(self.id_field.to_string(), id);
        }
    }

    pub fn id_kind(&self) -> ColumnKind {
        match self.blank.get(self.id_field) {
            Some(v) if !v.is_null() => ColumnKind::of(v),
            Some(_) => self.sampled_kind(self.id_field).unwrap_or(ColumnKind::Integer),
            None => ColumnKind::Integer,
        }
    }

    fn field_kind(&self, name: &str, zero: &Value) -> ColumnKind {
        if zero.is_null() {
            self.sampled_kind(name).unwrap_or(ColumnKind::Json)
        } else {
            ColumnKind::of(zero)
        }
    }

    /// Kind of a field whose zero value is null (an `Option`), found by asking
    /// the concrete type which sample value it accepts there.
    fn sampled_kind(&self, field: &str) -> Option<ColumnKind> {
        let Value::Object(base) = &self.blank else {
            return None;
        };
        let samples = [
            (ColumnKind::Json, Value::Object(Map::new())),
            (ColumnKind::Float, Value::from(0.5)),
            (ColumnKind::Integer, Value::from(0)),
            (ColumnKind::Bool, Value::Bool(true)),
            (ColumnKind::Text, Value::String(String::new())),
        ];
        samples.into_iter().find_map(|(kind, sample)| {
            let mut record = base.clone();
            record.insert(field.to_string(), sample);
            self.normalize(Value::Object(record))
                .ok()
                .filter(|v| v.get(field).is_some_and(|f| !f.is_null()))
                .map(|_| kind)
        })
    }

    /// All columns in field order, identifier included.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = match &self.blank {
            Value::Object(fields) => fields
                .iter()
                .map(|(name, v)| Column {
                    name: name.clone(),
                    kind: if name == self.id_field { self.id_kind() } else { self.field_kind(name, v) },
                })
                .collect(),
            _ => Vec::new(),
        };
        if !columns.iter().any(|c| c.name == self.id_field) {
            columns.insert(
                0,
                Column {
                    name: self.id_field.to_string(),
                    kind: self.id_kind(),
                },
            );
        }
        columns
    }
}

/// True for identifiers the storage layer should assign: null, 0 or "".
pub fn is_unset_id(id: Option<&Value>) -> bool {
    match id {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("id_field", &self.id_field)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct TestModel {
        id: u64,
        name: String,
    }
    impl Model for TestModel {}

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Ticket {
        code: String,
        price: f64,
        paid: bool,
        tags: Option<Vec<String>>,
    }
    impl Model for Ticket {
        const ID_FIELD: &'static str = "code";
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Counter(u32);
    impl Model for Counter {}

    #[test]
    fn descriptor_derives_names() {
        let d = TestModel::descriptor();
        assert_eq!(d.name(), "TestModel");
        assert_eq!(d.table(), "test_models");
        assert_eq!(d.resource_path(), "/testmodels");
        assert!(d.is_struct_shaped());
    }

    #[test]
    fn primitive_models_are_not_struct_shaped() {
        assert!(!Counter::descriptor().is_struct_shaped());
    }

    #[test]
    fn body_fields_merge_over_zero_values() {
        let d = TestModel::descriptor();
        let record = d.decode_body(br#"{"name":"x"}"#).unwrap();
        assert_eq!(record, serde_json::json!({"id": 0, "name": "x"}));
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        let d = TestModel::descriptor();
        assert!(d.decode_body(b"").is_err());
        assert!(d.decode_body(b"[1,2]").is_err());
        assert!(d.decode_body(br#"{"id":"abc"}"#).is_err());
    }

    #[test]
    fn columns_are_typed_from_zero_values() {
        let cols = Ticket::descriptor().columns();
        let kinds: Vec<_> = cols.iter().map(|c| (c.name.as_str(), c.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("code", ColumnKind::Text),
                ("price", ColumnKind::Float),
                ("paid", ColumnKind::Bool),
                ("tags", ColumnKind::Json),
            ]
        );
        assert_eq!(Ticket::descriptor().id_kind(), ColumnKind::Text);
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Profile {
        id: Option<String>,
        nickname: Option<String>,
        age: Option<i32>,
        score: Option<f64>,
        active: Option<bool>,
        extra: Option<serde_json::Value>,
    }
    impl Model for Profile {}

    #[test]
    fn optional_fields_take_the_kind_of_their_inner_type() {
        let kinds: Vec<_> = Profile::descriptor().columns().into_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Text,
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Bool,
                ColumnKind::Json,
            ]
        );
        assert_eq!(Profile::descriptor().id_kind(), ColumnKind::Text);
    }

    #[test]
    fn unset_ids() {
        assert!(is_unset_id(None));
        assert!(is_unset_id(Some(&serde_json::json!(0))));
        assert!(is_unset_id(Some(&serde_json::json!(""))));
        assert!(!is_unset_id(Some(&serde_json::json!(7))));
    }
}

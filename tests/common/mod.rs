//! Shared fixtures for the HTTP-level tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use resource_sdk::{
    AppError, Model, ModelDescriptor, PoolStats, RequestContext, State, StateProcessor, StateProvider, Storage,
    StorageError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tower::ServiceExt;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestModel {
    pub id: u64,
    pub name: String,
}

impl Model for TestModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MockOp {
    FindOne,
    FindAll,
    Create,
    Save,
    Delete,
    Ping,
    Close,
}

#[derive(Default)]
struct MockState {
    records: Vec<Value>,
    failures: HashMap<MockOp, fn() -> StorageError>,
    calls: Vec<MockOp>,
    last_id: u64,
    pool: Option<PoolStats>,
    stall_ping: bool,
}

/// Scriptable storage: holds records in insertion order, records every call
/// and fails any operation on request.
#[derive(Default)]
pub struct MockStorage {
    state: Mutex<MockState>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Value>) -> Self {
        let last_id = records.iter().filter_map(|r| r["id"].as_u64()).max().unwrap_or(0);
        MockStorage {
            state: Mutex::new(MockState {
                records,
                last_id,
                ..MockState::default()
            }),
        }
    }

    pub fn fail(&self, op: MockOp, err: fn() -> StorageError) {
        self.state.lock().unwrap().failures.insert(op, err);
    }

    pub fn set_pool_stats(&self, stats: PoolStats) {
        self.state.lock().unwrap().pool = Some(stats);
    }

    /// Make `ping` hang forever, like a database that stopped answering.
    pub fn stall_ping(&self) {
        self.state.lock().unwrap().stall_ping = true;
    }

    pub fn records(&self) -> Vec<Value> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn calls(&self) -> Vec<MockOp> {
        self.state.lock().unwrap().calls.clone()
    }

    fn enter(&self, op: MockOp) -> Result<std::sync::MutexGuard<'_, MockState>, StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        let failure = state.failures.get(&op).copied();
        match failure {
            Some(err) => Err(err()),
            None => Ok(state),
        }
    }
}

fn id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn find_one(&self, model: &ModelDescriptor, id: &str) -> Result<Value, StorageError> {
        let state = self.enter(MockOp::FindOne)?;
        state
            .records
            .iter()
            .find(|r| r.get(model.id_field()).map(id_text).as_deref() == Some(id))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn find_all(&self, _model: &ModelDescriptor) -> Result<Vec<Value>, StorageError> {
        let state = self.enter(MockOp::FindAll)?;
        Ok(state.records.clone())
    }

    async fn create(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError> {
        let mut state = self.enter(MockOp::Create)?;
        let mut record = model.complete(record)?;
        state.last_id += 1;
        model.set_id(&mut record, Value::from(state.last_id));
        state.records.push(record.clone());
        Ok(record)
    }

    async fn save(&self, model: &ModelDescriptor, record: Value) -> Result<Value, StorageError> {
        let mut state = self.enter(MockOp::Save)?;
        let record = model.complete(record)?;
        let id = record.get(model.id_field()).map(id_text);
        match state.records.iter_mut().find(|r| r.get(model.id_field()).map(id_text) == id) {
            Some(existing) => *existing = record.clone(),
            None => state.records.push(record.clone()),
        }
        Ok(record)
    }

    async fn delete(&self, model: &ModelDescriptor, record: &Value) -> Result<(), StorageError> {
        let mut state = self.enter(MockOp::Delete)?;
        let id = record.get(model.id_field()).map(id_text);
        let before = state.records.len();
        state.records.retain(|r| r.get(model.id_field()).map(id_text) != id);
        if state.records.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let stall = self.enter(MockOp::Ping)?.stall_ping;
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        self.state.lock().unwrap().pool
    }

    async fn close(&self) {
        self.state.lock().unwrap().calls.push(MockOp::Close);
    }
}

/// Provider returning a fixed state.
pub struct FixedProvider(pub State);

#[async_trait]
impl StateProvider for FixedProvider {
    async fn provide(&self, _ctx: &RequestContext) -> Result<State, AppError> {
        Ok(self.0.clone())
    }
}

/// Processor returning a fixed state, ignoring what it was given.
pub struct FixedProcessor(pub State);

#[async_trait]
impl StateProcessor for FixedProcessor {
    async fn process(&self, _ctx: &RequestContext, _data: State) -> Result<State, AppError> {
        Ok(self.0.clone())
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Bytes) {
    send_raw(router, method, uri, body.map(|b| b.to_string()).unwrap_or_default()).await
}

pub async fn send_raw(router: &Router, method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Bytes) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes)
}

pub fn json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

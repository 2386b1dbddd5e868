//! Two-stage request pipeline: a provider fetches the data an operation starts
//! from, a processor applies the operation and yields the response payload.

mod processor;
mod provider;
mod validation;

pub use processor::DefaultProcessor;
pub use provider::DefaultProvider;
pub use validation::validate_model;

use crate::error::AppError;
use crate::model::ModelDescriptor;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::Method;
use serde_json::Value;
use std::sync::Arc;

/// Opaque data handle passed between pipeline stages.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum State {
    /// Nothing to return; answered with 204 No Content.
    #[default]
    Empty,
    Item(Value),
    Collection(Vec<Value>),
}

impl State {
    pub fn is_empty(&self) -> bool {
        matches!(self, State::Empty)
    }
}

/// Per-request inputs threaded through provider and processor.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub model: Option<Arc<ModelDescriptor>>,
    /// Value of the `:id` path parameter, when the route has one.
    pub id: Option<String>,
    pub body: Bytes,
}

impl RequestContext {
    pub fn new(method: Method, model: Arc<ModelDescriptor>) -> Self {
        RequestContext {
            method,
            model: Some(model),
            id: None,
            body: Bytes::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Prepares the initial state of an operation, typically by reading storage.
#[async_trait]
pub trait StateProvider: Send + Sync {
    async fn provide(&self, ctx: &RequestContext) -> Result<State, AppError>;

    /// Type name, for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Applies an operation to the provided state and returns what to respond with.
#[async_trait]
pub trait StateProcessor: Send + Sync {
    async fn process(&self, ctx: &RequestContext, data: State) -> Result<State, AppError>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

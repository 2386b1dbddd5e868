//! Storage-backed processor. Behavior is keyed on the HTTP method, not on the
//! operation: POST creates, PUT updates, DELETE deletes, anything else passes
//! the provided state through untouched.

use crate::error::AppError;
use crate::model::ModelDescriptor;
use crate::state::{validate_model, RequestContext, State, StateProcessor};
use crate::storage::Storage;
use async_trait::async_trait;
use axum::http::Method;
use std::sync::Arc;

#[derive(Clone)]
pub struct DefaultProcessor {
    storage: Arc<dyn Storage>,
}

impl DefaultProcessor {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        DefaultProcessor { storage }
    }

    async fn handle_create(&self, ctx: &RequestContext, model: &ModelDescriptor) -> Result<State, AppError> {
        let record = decode(ctx, model)?;
        let created = self.storage.create(model, record).await.map_err(|e| {
            tracing::warn!(model = model.name(), error = %e, "create failed");
            AppError::StorageFailure("failed to create record".into())
        })?;
        Ok(State::Item(created))
    }

    async fn handle_update(
        &self,
        ctx: &RequestContext,
        model: &ModelDescriptor,
        existing: State,
    ) -> Result<State, AppError> {
        let State::Item(existing) = existing else {
            return Err(AppError::PreconditionFailed("record not found".into()));
        };
        let mut record = decode(ctx, model)?;
        // The addressed record wins over whatever id the body carries.
        if let Some(id) = model.id_of(&existing) {
            model.set_id(&mut record, id.clone());
        }
        let saved = self.storage.save(model, record).await.map_err(|e| {
            tracing::warn!(model = model.name(), error = %e, "save failed");
            AppError::StorageFailure("failed to update record".into())
        })?;
        Ok(State::Item(saved))
    }

    async fn handle_delete(&self, model: &ModelDescriptor, data: State) -> Result<State, AppError> {
        let State::Item(record) = data else {
            return Err(AppError::PreconditionFailed("no data to delete".into()));
        };
        self.storage.delete(model, &record).await.map_err(|e| {
            tracing::warn!(model = model.name(), error = %e, "delete failed");
            AppError::StorageFailure("failed to delete record".into())
        })?;
        Ok(State::Empty)
    }
}

fn decode(ctx: &RequestContext, model: &ModelDescriptor) -> Result<serde_json::Value, AppError> {
    model.decode_body(&ctx.body).map_err(|e| {
        tracing::debug!(model = model.name(), error = %e, "body rejected");
        AppError::MalformedInput("invalid request body".into())
    })
}

#[async_trait]
impl StateProcessor for DefaultProcessor {
    async fn process(&self, ctx: &RequestContext, data: State) -> Result<State, AppError> {
        let model = validate_model(ctx)?;
        match ctx.method {
            Method::POST => self.handle_create(ctx, model).await,
            Method::PUT => self.handle_update(ctx, model, data).await,
            Method::DELETE => self.handle_delete(model, data).await,
            _ => Ok(data),
        }
    }
}

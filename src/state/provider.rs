//! Storage-backed provider: one record when the route carries an id, the whole
//! collection otherwise.

use crate::error::{AppError, StorageError};
use crate::model::ModelDescriptor;
use crate::state::{validate_model, RequestContext, State, StateProvider};
use crate::storage::Storage;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub struct DefaultProvider {
    storage: Arc<dyn Storage>,
}

impl DefaultProvider {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        DefaultProvider { storage }
    }

    async fn find_by_id(&self, model: &ModelDescriptor, id: &str) -> Result<State, AppError> {
        match self.storage.find_one(model, id).await {
            Ok(record) => Ok(State::Item(record)),
            Err(StorageError::NotFound) => Err(AppError::NotFound("record not found".into())),
            Err(e) => {
                tracing::warn!(model = model.name(), id, error = %e, "find one failed");
                Err(AppError::StorageFailure("database error".into()))
            }
        }
    }

    async fn find_all(&self, model: &ModelDescriptor) -> Result<State, AppError> {
        match self.storage.find_all(model).await {
            Ok(records) => Ok(State::Collection(records)),
            Err(e) => {
                tracing::warn!(model = model.name(), error = %e, "find all failed");
                Err(AppError::StorageFailure("failed to fetch records".into()))
            }
        }
    }
}

#[async_trait]
impl StateProvider for DefaultProvider {
    async fn provide(&self, ctx: &RequestContext) -> Result<State, AppError> {
        let model = validate_model(ctx)?;
        match ctx.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => self.find_by_id(model, id).await,
            None => self.find_all(model).await,
        }
    }
}

//! Resources: a model's CRUD routes plus the provider/processor wiring each
//! route dispatches through.

mod config;
mod manager;
mod operation;

pub use config::{OperationConfig, ResourceConfig};
pub use manager::{customizer, Customizer, ResourceManager};
pub use operation::Operation;

use crate::error::AppError;
use crate::response::respond;
use crate::state::{RequestContext, State};
use axum::{
    body::Bytes,
    extract::Path,
    http::Method,
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Router,
};
use std::sync::Arc;

/// Implemented by model types that know how to build their own resource.
pub trait Registrable {
    fn create_resource(&self, manager: &ResourceManager) -> Resource;
}

#[derive(Clone, Debug)]
pub struct Resource {
    config: ResourceConfig,
}

impl Resource {
    pub fn new(config: ResourceConfig) -> Self {
        Resource { config }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Apply one more customizer before routes are registered.
    pub fn customize(mut self, f: impl FnOnce(&mut ResourceConfig)) -> Self {
        f(&mut self.config);
        self
    }

    /// Register one route per enabled operation. Disabled operations get no
    /// route, so requests to them fall through to the router.
    ///
    /// Panics (like any axum route registration) when another resource already
    /// claimed the same method and path.
    pub fn register_routes<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut config = self.config.clone();
        if !config.path.starts_with('/') {
            tracing::warn!(path = %config.path, "resource path does not start with '/'; prefixing it");
            config.path = format!("/{}", config.path);
        }
        let config = Arc::new(config);

        let mut collection: Option<MethodRouter<S>> = None;
        let mut item: Option<MethodRouter<S>> = None;
        for op in config.enabled_operations() {
            if op.targets_item() {
                let cfg = config.clone();
                let handler = move |method: Method, Path(id): Path<String>, body: Bytes| async move {
                    into_response(dispatch(&cfg, op, method, Some(id), body).await)
                };
                item = Some(match item {
                    Some(mr) => mr.on(op.method_filter(), handler),
                    None => axum::routing::on(op.method_filter(), handler),
                });
            } else {
                let cfg = config.clone();
                let handler = move |method: Method, body: Bytes| async move {
                    into_response(dispatch(&cfg, op, method, None, body).await)
                };
                collection = Some(match collection {
                    Some(mr) => mr.on(op.method_filter(), handler),
                    None => axum::routing::on(op.method_filter(), handler),
                });
            }
        }

        let mut router = router;
        if let Some(mr) = collection {
            router = router.route(&config.path, mr);
        }
        if let Some(mr) = item {
            router = router.route(&Operation::GetItem.route(&config.path), mr);
        }
        router
    }
}

fn into_response(result: Result<State, AppError>) -> Response {
    match result {
        Ok(state) => respond(state),
        Err(err) => err.into_response(),
    }
}

/// Provider then processor for one matched operation.
async fn dispatch(
    config: &ResourceConfig,
    op: Operation,
    method: Method,
    id: Option<String>,
    body: Bytes,
) -> Result<State, AppError> {
    tracing::debug!(operation = %op, path = %config.path, method = %method, "dispatching");
    let Some(op_config) = config.operation(op).filter(|c| c.enabled) else {
        return Err(AppError::RouteDisabled("Operation not found".into()));
    };
    let (Some(provider), Some(processor)) = (&op_config.provider, &op_config.processor) else {
        tracing::warn!(operation = %op, path = %config.path, "operation enabled without provider or processor");
        return Err(AppError::RouteDisabled("Operation not found".into()));
    };

    let mut ctx = RequestContext::new(method, config.model.clone()).with_body(body);
    ctx.id = id;

    let data = provider.provide(&ctx).await?;
    processor.process(&ctx, data).await
}

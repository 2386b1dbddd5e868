//! Application shell: storage, resource registration, health routes, serving.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::model::ModelDescriptor;
use crate::resource::{Registrable, Resource, ResourceManager};
use crate::routes::health_routes;
use crate::storage::{PgStorage, Storage};
use axum::{extract::DefaultBodyLimit, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// State shared with the non-resource routes.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
}

pub struct App {
    config: AppConfig,
    storage: Arc<dyn Storage>,
    manager: ResourceManager,
    router: Router,
}

impl App {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Self {
        App {
            manager: ResourceManager::new(storage.clone()),
            config,
            storage,
            router: Router::new(),
        }
    }

    /// Open the PostgreSQL pool named by `DATABASE_URL`, creating the database
    /// when it does not exist yet.
    pub async fn connect(config: AppConfig) -> Result<Self, AppError> {
        let url = config.require_database_url()?;
        let storage = PgStorage::connect(url, config.max_connections).await?;
        storage.ping().await?;
        tracing::info!("connected to database");
        Ok(Self::new(config, Arc::new(storage)))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn manager(&self) -> &ResourceManager {
        &self.manager
    }

    pub fn register_resource(&mut self, registrable: &impl Registrable) -> &mut Self {
        let resource = registrable.create_resource(&self.manager);
        self.register(resource)
    }

    /// Register routes for an already built resource.
    pub fn register(&mut self, resource: Resource) -> &mut Self {
        let config = resource.config();
        let enabled: Vec<&str> = config.enabled_operations().iter().map(|op| op.as_str()).collect();
        tracing::info!(
            model = config.model.name(),
            path = %config.path,
            operations = ?enabled,
            "registering resource"
        );
        for op in config.enabled_operations() {
            if let Some(op_config) = config.operation(op) {
                tracing::debug!(
                    operation = %op,
                    route = %op.route(&config.path),
                    provider = op_config.provider.as_ref().map(|p| p.name()).unwrap_or("<none>"),
                    processor = op_config.processor.as_ref().map(|p| p.name()).unwrap_or("<none>"),
                    "operation wired"
                );
            }
        }
        let router = std::mem::take(&mut self.router);
        self.router = resource.register_routes(router);
        self
    }

    pub async fn migrate(&self, models: &[ModelDescriptor]) -> Result<(), AppError> {
        self.storage.migrate(models).await?;
        Ok(())
    }

    /// GET /health, /ready and /version.
    pub fn register_health_routes(&mut self) -> &mut Self {
        let state = AppState {
            storage: self.storage.clone(),
        };
        let router = std::mem::take(&mut self.router);
        self.router = router.merge(health_routes(state));
        self
    }

    /// Final router with request tracing and the request body limit applied.
    pub fn into_router(self) -> Router {
        self.router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(self.config.body_limit_bytes)),
        )
    }

    /// Serve on `bind_addr` until Ctrl+C or SIGTERM.
    pub async fn serve(self) -> Result<(), AppError> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve on `bind_addr` until `signal` resolves, then drain in-flight
    /// requests and close the storage.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        let storage = self.storage.clone();
        let served = axum::serve(listener, self.into_router())
            .with_graceful_shutdown(signal)
            .await;
        storage.close().await;
        tracing::info!("server stopped");
        Ok(served?)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

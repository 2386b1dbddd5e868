//! Common routes: health, readiness, version.

use crate::app::AppState;
use crate::storage::PoolStats;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::time::Duration;

/// Longest a readiness ping may take before storage counts as down.
pub const READY_TIMEOUT: Duration = Duration::from_secs(1);

/// Open connections above which readiness reports heavy load.
const HEAVY_LOAD_CONNECTIONS: u32 = 40;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    database: &'static str,
    message: &'static str,
    #[serde(flatten)]
    pool: Option<PoolStats>,
}

impl ReadyBody {
    fn down(message: &'static str) -> (StatusCode, Json<ReadyBody>) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "down",
                database: "unavailable",
                message,
                pool: None,
            }),
        )
    }
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    match tokio::time::timeout(READY_TIMEOUT, state.storage.ping()).await {
        Err(_) => {
            tracing::error!(timeout = ?READY_TIMEOUT, "readiness ping timed out");
            return ReadyBody::down("database ping timed out");
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "readiness ping failed");
            return ReadyBody::down("database ping failed");
        }
        Ok(Ok(())) => {}
    }

    let pool = state.storage.pool_stats();
    let mut message = "It's healthy";
    if let Some(stats) = pool {
        tracing::debug!(
            open_connections = stats.open_connections,
            in_use = stats.in_use,
            idle = stats.idle,
            max_connections = stats.max_connections,
            "connection pool statistics"
        );
        if stats.open_connections > HEAVY_LOAD_CONNECTIONS {
            tracing::warn!(
                open_connections = stats.open_connections,
                threshold = HEAVY_LOAD_CONNECTIONS,
                "high number of open connections"
            );
            message = "The database is experiencing heavy load.";
        }
        if stats.max_connections > 0 && stats.in_use >= stats.max_connections {
            tracing::warn!(in_use = stats.in_use, "connection pool exhausted");
            message = "All pooled connections are in use; requests are waiting for a connection.";
        }
    }
    (
        StatusCode::OK,
        Json(ReadyBody {
            status: "up",
            database: "ok",
            message,
            pool,
        }),
    )
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready (pings storage), GET /version.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}

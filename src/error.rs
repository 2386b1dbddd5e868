//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing setting: {0}")]
    Missing(&'static str),
}

/// Failures reported by a [`crate::storage::Storage`] backend.
///
/// `NotFound` is kept apart from every other failure so callers can tell a
/// missing record from a broken backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("{0}")]
    Backend(String),
}

/// Response-ready errors. Each variant carries the message sent to the client;
/// the status is fixed by the variant.
#[derive(Error, Debug)]
pub enum AppError {
    /// Model descriptor missing from the request context or not struct-shaped.
    #[error("{0}")]
    InvalidContext(String),
    /// Request body cannot be decoded into the model.
    #[error("{0}")]
    MalformedInput(String),
    /// Update/delete reached the processor without prior-state data.
    #[error("{0}")]
    PreconditionFailed(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    StorageFailure(String),
    /// Dispatch reached an operation that is disabled or not wired.
    #[error("{0}")]
    RouteDisabled(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidContext(_)
            | AppError::MalformedInput(_)
            | AppError::PreconditionFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::RouteDisabled(_) => StatusCode::NOT_FOUND,
            AppError::StorageFailure(_)
            | AppError::Config(_)
            | AppError::Storage(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidContext(_) => "invalid_context",
            AppError::MalformedInput(_) => "malformed_input",
            AppError::PreconditionFailed(_) => "precondition_failed",
            AppError::NotFound(_) => "not_found",
            AppError::StorageFailure(_) | AppError::Storage(_) => "storage_failure",
            AppError::RouteDisabled(_) => "route_disabled",
            AppError::Config(_) => "config_error",
            AppError::Io(_) => "internal_error",
        }
    }

    /// Message exposed to clients. Shell-level failures never leak their details.
    fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "storage error".to_string(),
            AppError::Config(_) | AppError::Io(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::InvalidContext("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MalformedInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PreconditionFailed("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::StorageFailure("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::RouteDisabled("x".into()).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn body_carries_code_and_message() {
        let resp = AppError::NotFound("record not found".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "record not found");
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let err = AppError::Storage(StorageError::Backend("password=hunter2".into()));
        let resp = err.into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
    }
}

//! Resource SDK: CRUD REST routes generated from model types, each route
//! running a pluggable provider/processor pipeline over a storage backend.

pub mod app;
pub mod case;
pub mod config;
pub mod error;
pub mod logging;
pub mod migration;
pub mod model;
pub mod resource;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod storage;

pub use app::{App, AppState};
pub use config::{AppConfig, LogFormat};
pub use error::{AppError, ConfigError, StorageError};
pub use logging::{init_tracing, init_tracing_for};
pub use model::{Model, ModelDescriptor};
pub use resource::{
    customizer, Customizer, Operation, OperationConfig, Registrable, Resource, ResourceConfig, ResourceManager,
};
pub use routes::health_routes;
pub use state::{DefaultProcessor, DefaultProvider, RequestContext, State, StateProcessor, StateProvider};
pub use storage::{ensure_database_exists, MemoryStorage, PgStorage, PoolStats, Storage};

//! Example consumer: serves Book and Author resources.
//!
//! Run from repo root: `cargo run -p example-consumer` (needs DATABASE_URL)
//! or `cargo run -p example-consumer -- --memory` for in-process storage.

use resource_sdk::{
    customizer, init_tracing_for, App, AppConfig, MemoryStorage, Model, Operation, Registrable, Resource,
    ResourceManager,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Book {
    id: u64,
    title: String,
    author_id: u64,
    published_year: i32,
    in_print: bool,
}

impl Model for Book {}

impl Registrable for Book {
    fn create_resource(&self, manager: &ResourceManager) -> Resource {
        manager.create_resource::<Book>()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Author {
    id: u64,
    name: String,
    country: String,
}

impl Model for Author {}

impl Registrable for Author {
    /// Authors are served under /writers and cannot be deleted.
    fn create_resource(&self, manager: &ResourceManager) -> Resource {
        manager.create_resource_with::<Author>(vec![
            customizer(|rc| rc.path = "/writers".into()),
            customizer(|rc| {
                rc.disable(Operation::Delete);
            }),
        ])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing_for(&config, &[env!("CARGO_CRATE_NAME")]);

    let in_memory = std::env::args().any(|a| a == "--memory");
    let mut app = if in_memory {
        tracing::info!("using in-memory storage");
        App::new(config, Arc::new(MemoryStorage::new()))
    } else {
        App::connect(config).await?
    };

    app.migrate(&[Book::descriptor(), Author::descriptor()]).await?;
    app.register_resource(&Book::default())
        .register_resource(&Author::default())
        .register_health_routes();
    app.serve().await?;
    Ok(())
}

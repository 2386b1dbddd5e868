//! Builds resources for models with the storage-backed pipeline wired into
//! every operation.

use crate::model::{Model, ModelDescriptor};
use crate::resource::{Operation, OperationConfig, Resource, ResourceConfig};
use crate::state::{DefaultProcessor, DefaultProvider, StateProcessor, StateProvider};
use crate::storage::Storage;
use std::sync::Arc;

/// Adjusts a resource configuration before routes are registered.
pub type Customizer = Box<dyn FnOnce(&mut ResourceConfig) + Send>;

/// Box a closure as a [`Customizer`].
pub fn customizer(f: impl FnOnce(&mut ResourceConfig) + Send + 'static) -> Customizer {
    Box::new(f)
}

#[derive(Clone)]
pub struct ResourceManager {
    storage: Arc<dyn Storage>,
}

impl ResourceManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ResourceManager { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Resource for `M` with default path and all five operations enabled.
    pub fn create_resource<M: Model>(&self) -> Resource {
        self.create_resource_with::<M>(Vec::new())
    }

    /// Like [`create_resource`](Self::create_resource), then applies the
    /// customizers in order. Their output is not validated.
    pub fn create_resource_with<M: Model>(&self, customizers: Vec<Customizer>) -> Resource {
        let mut config = self.default_config(M::descriptor());
        for customize in customizers {
            customize(&mut config);
        }
        Resource::new(config)
    }

    fn default_config(&self, model: ModelDescriptor) -> ResourceConfig {
        let path = model.resource_path();
        let provider: Arc<dyn StateProvider> = Arc::new(DefaultProvider::new(self.storage.clone()));
        let processor: Arc<dyn StateProcessor> = Arc::new(DefaultProcessor::new(self.storage.clone()));
        let mut config = ResourceConfig::new(model, path);
        for op in Operation::ALL {
            config
                .operations
                .insert(op, OperationConfig::new(provider.clone(), processor.clone()));
        }
        config
    }
}

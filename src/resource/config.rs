//! Per-resource and per-operation configuration.

use crate::model::ModelDescriptor;
use crate::resource::Operation;
use crate::state::{StateProcessor, StateProvider};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Provider and processor bound to one operation.
#[derive(Clone, Default)]
pub struct OperationConfig {
    pub provider: Option<Arc<dyn StateProvider>>,
    pub processor: Option<Arc<dyn StateProcessor>>,
    pub enabled: bool,
}

impl OperationConfig {
    pub fn new(provider: Arc<dyn StateProvider>, processor: Arc<dyn StateProcessor>) -> Self {
        OperationConfig {
            provider: Some(provider),
            processor: Some(processor),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

impl fmt::Debug for OperationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationConfig")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("processor", &self.processor.as_ref().map(|p| p.name()))
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Model, base path and operation wiring of a resource.
#[derive(Clone, Debug)]
pub struct ResourceConfig {
    pub model: Arc<ModelDescriptor>,
    pub path: String,
    pub operations: HashMap<Operation, OperationConfig>,
}

impl ResourceConfig {
    pub fn new(model: ModelDescriptor, path: impl Into<String>) -> Self {
        ResourceConfig {
            model: Arc::new(model),
            path: path.into(),
            operations: HashMap::new(),
        }
    }

    pub fn operation(&self, op: Operation) -> Option<&OperationConfig> {
        self.operations.get(&op)
    }

    /// Mutable access; inserts a disabled entry when the operation is absent.
    pub fn operation_mut(&mut self, op: Operation) -> &mut OperationConfig {
        self.operations.entry(op).or_default()
    }

    pub fn is_enabled(&self, op: Operation) -> bool {
        self.operation(op).is_some_and(|c| c.enabled)
    }

    /// Enabled operations in route registration order.
    pub fn enabled_operations(&self) -> Vec<Operation> {
        Operation::ALL.into_iter().filter(|op| self.is_enabled(*op)).collect()
    }

    pub fn disable(&mut self, op: Operation) -> &mut Self {
        self.operation_mut(op).enabled = false;
        self
    }

    pub fn set_provider(&mut self, op: Operation, provider: Arc<dyn StateProvider>) -> &mut Self {
        self.operation_mut(op).provider = Some(provider);
        self
    }

    pub fn set_processor(&mut self, op: Operation, processor: Arc<dyn StateProcessor>) -> &mut Self {
        self.operation_mut(op).processor = Some(processor);
        self
    }
}

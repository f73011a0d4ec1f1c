//! Operation registry.
//!
//! The registry is assembled once at startup from the capability gates and is
//! read-only afterwards. It keeps descriptors in insertion order, which is the
//! order `tools/list` reports them in.

use crate::context::ConnectionContext;
use crate::error::{OperationError, RegistryError};
use crate::operations::{
    self, Aggregate, CountDocuments, DeleteMany, DeleteOne, Find, FindOne, FindOneAndDelete,
    FindOneAndReplace, FindOneAndUpdate, InsertMany, InsertOne, ListCollections, Operation,
    OperationId, UpdateMany, UpdateOne,
};
use crate::protocol::{ToolAnnotations, ToolDefinition};
use async_trait::async_trait;
use mongo_mcp_core::Capabilities;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Operations exposed under the given capability gates, in listing order.
pub fn enabled_operations(capabilities: Capabilities) -> Vec<OperationId> {
    let mut ids = vec![
        OperationId::ListCollections,
        OperationId::CountDocuments,
        OperationId::FindOne,
        OperationId::Find,
    ];

    if !capabilities.read_only {
        ids.extend([
            OperationId::InsertOne,
            OperationId::InsertMany,
            OperationId::FindOneAndUpdate,
            OperationId::FindOneAndReplace,
            OperationId::UpdateOne,
            OperationId::UpdateMany,
            OperationId::DeleteOne,
            OperationId::DeleteMany,
            OperationId::FindOneAndDelete,
        ]);
    }

    if capabilities.allow_aggregates {
        ids.push(OperationId::Aggregate);
    }

    ids
}

/// Type-erased entry point of one operation.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Decode raw arguments and run the operation.
    async fn invoke(
        &self,
        context: &ConnectionContext,
        arguments: Value,
    ) -> Result<Value, OperationError>;
}

struct Handler<O: Operation> {
    operation: O,
}

#[async_trait]
impl<O: Operation> OperationHandler for Handler<O> {
    async fn invoke(
        &self,
        context: &ConnectionContext,
        arguments: Value,
    ) -> Result<Value, OperationError> {
        let input = operations::decode::<O>(arguments)?;
        operations::run(&self.operation, context, input).await
    }
}

/// Everything the adapter needs to list and invoke one operation.
#[derive(Clone)]
pub struct OperationDescriptor {
    pub id: OperationId,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    pub output_schema: Value,
    handler: Arc<dyn OperationHandler>,
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl OperationDescriptor {
    /// Describe an operation from its trait implementation.
    pub fn of<O: Operation>(operation: O) -> Self {
        Self {
            id: O::ID,
            name: O::ID.name(),
            title: O::ID.title(),
            description: operation.description(),
            input_schema: operation.input_schema(),
            output_schema: operation.output_schema(),
            handler: Arc::new(Handler { operation }),
        }
    }

    /// The descriptor of a catalog operation.
    pub fn for_id(id: OperationId) -> Self {
        match id {
            OperationId::ListCollections => Self::of(ListCollections),
            OperationId::CountDocuments => Self::of(CountDocuments),
            OperationId::FindOne => Self::of(FindOne),
            OperationId::Find => Self::of(Find),
            OperationId::InsertOne => Self::of(InsertOne),
            OperationId::InsertMany => Self::of(InsertMany),
            OperationId::FindOneAndUpdate => Self::of(FindOneAndUpdate),
            OperationId::FindOneAndReplace => Self::of(FindOneAndReplace),
            OperationId::UpdateOne => Self::of(UpdateOne),
            OperationId::UpdateMany => Self::of(UpdateMany),
            OperationId::DeleteOne => Self::of(DeleteOne),
            OperationId::DeleteMany => Self::of(DeleteMany),
            OperationId::FindOneAndDelete => Self::of(FindOneAndDelete),
            OperationId::Aggregate => Self::of(Aggregate),
        }
    }

    /// Whether the operation leaves stored data untouched.
    pub fn read_only(&self) -> bool {
        !self.id.is_mutating()
    }

    pub fn to_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.to_string(),
            title: Some(self.title.to_string()),
            description: Some(self.description.to_string()),
            input_schema: self.input_schema.clone(),
            output_schema: Some(self.output_schema.clone()),
            annotations: Some(ToolAnnotations {
                read_only_hint: Some(self.read_only()),
                destructive_hint: Some(self.id.is_destructive()),
            }),
        }
    }

    pub async fn invoke(
        &self,
        context: &ConnectionContext,
        arguments: Value,
    ) -> Result<Value, OperationError> {
        self.handler.invoke(context, arguments).await
    }
}

/// Registry of the operations this server exposes.
#[derive(Clone, Debug, Default)]
pub struct OperationRegistry {
    descriptors: Vec<OperationDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl OperationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for the given capability gates.
    pub fn from_capabilities(capabilities: Capabilities) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for id in enabled_operations(capabilities) {
            registry.register(OperationDescriptor::for_id(id))?;
        }
        Ok(registry)
    }

    /// Register a descriptor. Names must be unique.
    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateOperation {
                name: descriptor.name.to_string(),
            });
        }
        self.index.insert(descriptor.name, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Get a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Check if an operation is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List all descriptors in registration order.
    pub fn list(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    /// Get the number of registered operations.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Get operation names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.descriptors
            .iter()
            .map(OperationDescriptor::to_tool_definition)
            .collect()
    }
}

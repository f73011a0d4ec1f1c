//! Connection context and database resolution.
//!
//! The [`ConnectionContext`] is built once at startup and shared read-only by
//! every operation. [`ConnectionContext::database`] is the single precondition
//! all handlers go through: it picks the database a request targets, or
//! fails before any backend call is made.

use crate::backend::{
    DeleteSummary, DocumentStore, InsertManySummary, InsertOneSummary, Namespace, UpdateSummary,
};
use crate::error::{BackendError, OperationError};
use crate::options::{AggregateSettings, PageBounds};
use mongo_mcp_core::Capabilities;
use mongodb::bson::Document;
use std::sync::Arc;

/// Live client handle plus the startup configuration the handlers need.
#[derive(Clone)]
pub struct ConnectionContext {
    store: Arc<dyn DocumentStore>,
    default_database: Option<String>,
    capabilities: Capabilities,
}

impl ConnectionContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        default_database: Option<String>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            store,
            default_database,
            capabilities,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Resolve the database a request operates on.
    pub fn database(&self, requested: Option<&str>) -> Result<Database<'_>, OperationError> {
        let name = resolve_database_name(requested, self.default_database())?;
        Ok(Database {
            store: self.store(),
            name: name.to_string(),
        })
    }
}

/// Pick the target database name.
///
/// A non-empty request value wins, then a non-empty configured default.
/// There is no implicit fallback (not even the database in the connection
/// string).
pub fn resolve_database_name<'a>(
    requested: Option<&'a str>,
    default: Option<&'a str>,
) -> Result<&'a str, OperationError> {
    requested
        .filter(|name| !name.is_empty())
        .or(default.filter(|name| !name.is_empty()))
        .ok_or(OperationError::MissingDatabaseSelection)
}

/// A resolved database.
pub struct Database<'a> {
    store: &'a dyn DocumentStore,
    name: String,
}

impl<'a> Database<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self, collection: &str) -> Collection<'a> {
        Collection {
            store: self.store,
            namespace: Namespace::new(self.name.clone(), collection),
        }
    }

    pub async fn list_collection_names(&self) -> Result<Vec<String>, BackendError> {
        self.store.list_collection_names(&self.name).await
    }
}

/// A named collection inside a resolved database.
///
/// Thin pass-through to the store so operation code reads like driver code.
pub struct Collection<'a> {
    store: &'a dyn DocumentStore,
    namespace: Namespace,
}

impl Collection<'_> {
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub async fn count_documents(
        &self,
        filter: Document,
        bounds: Option<PageBounds>,
    ) -> Result<u64, BackendError> {
        self.store
            .count_documents(&self.namespace, filter, bounds)
            .await
    }

    pub async fn find(
        &self,
        filter: Document,
        bounds: PageBounds,
    ) -> Result<Vec<Document>, BackendError> {
        self.store.find(&self.namespace, filter, bounds).await
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<Document>, BackendError> {
        self.store.find_one(&self.namespace, filter).await
    }

    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<Vec<Document>, BackendError> {
        self.store.aggregate(&self.namespace, pipeline, settings).await
    }

    pub async fn insert_one(&self, document: Document) -> Result<InsertOneSummary, BackendError> {
        self.store.insert_one(&self.namespace, document).await
    }

    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary, BackendError> {
        self.store.insert_many(&self.namespace, documents).await
    }

    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        self.store
            .update_one(&self.namespace, filter, update, upsert)
            .await
    }

    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        self.store
            .update_many(&self.namespace, filter, update, upsert)
            .await
    }

    pub async fn delete_one(&self, filter: Document) -> Result<DeleteSummary, BackendError> {
        self.store.delete_one(&self.namespace, filter).await
    }

    pub async fn delete_many(&self, filter: Document) -> Result<DeleteSummary, BackendError> {
        self.store.delete_many(&self.namespace, filter).await
    }

    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        self.store
            .find_one_and_update(&self.namespace, filter, update, upsert)
            .await
    }

    pub async fn find_one_and_replace(
        &self,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        self.store
            .find_one_and_replace(&self.namespace, filter, replacement, upsert)
            .await
    }

    pub async fn find_one_and_delete(
        &self,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        self.store.find_one_and_delete(&self.namespace, filter).await
    }
}

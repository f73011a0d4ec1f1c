//! Backend store abstraction.
//!
//! [`DocumentStore`] is the seam between the operation handlers and the
//! database client. The production implementation is
//! [`crate::mongo::MongoStore`]; tests plug in an in-memory store.
//!
//! Every method maps to one driver call. Implementations must not retry and
//! must report errors with the driver's own message.

use crate::error::BackendError;
use crate::options::{AggregateSettings, PageBounds};
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::fmt;

/// A collection within a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Outcome of a single insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneSummary {
    pub inserted_id: Bson,
}

/// Outcome of a batch insert; ids are in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManySummary {
    pub inserted_ids: Vec<Bson>,
}

/// Outcome of an update, as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

/// Outcome of a delete, as reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

/// Per-collection operations offered by the database client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of all collections in `database`. The listing filter is always
    /// empty.
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, BackendError>;

    /// Count matches for `filter`. With `bounds`, the count is restricted to
    /// that window.
    async fn count_documents(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: Option<PageBounds>,
    ) -> Result<u64, BackendError>;

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: PageBounds,
    ) -> Result<Vec<Document>, BackendError>;

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError>;

    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<Vec<Document>, BackendError>;

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> Result<InsertOneSummary, BackendError>;

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary, BackendError>;

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError>;

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError>;

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError>;

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError>;

    /// Update the first match and return the post-update document.
    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError>;

    /// Replace the first match and return the replacement as stored.
    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError>;

    /// Delete the first match and return it.
    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_display() {
        assert_eq!(Namespace::new("shop", "orders").to_string(), "shop.orders");
    }
}

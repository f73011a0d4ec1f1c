//! [`DocumentStore`] backed by the official MongoDB driver.
//!
//! Connection pooling, server selection and timeouts are the driver's
//! business; this adapter only translates calls and results.

use crate::backend::{
    DeleteSummary, DocumentStore, InsertManySummary, InsertOneSummary, Namespace, UpdateSummary,
};
use crate::error::BackendError;
use crate::options::{AggregateSettings, PageBounds};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::{ClientOptions, ReturnDocument, ServerApi, ServerApiVersion};
use mongodb::results::UpdateResult;
use mongodb::{Client, Collection};
use std::collections::HashMap;

/// MongoDB client handle shared by all operations.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    /// Connect to `uri` and verify the deployment answers a `ping`.
    ///
    /// The driver connects lazily, so the ping is what turns an unreachable
    /// or unauthenticated backend into a startup failure.
    pub async fn connect(uri: &str) -> Result<Self, BackendError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;

        tracing::info!("Connected to MongoDB");
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, namespace: &Namespace) -> Collection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }
}

/// The driver takes a signed find limit; a negative one means "single batch".
fn find_limit(bounds: PageBounds) -> i64 {
    i64::try_from(bounds.limit).unwrap_or(i64::MAX)
}

/// Inserted ids in input order. The driver reports them keyed by index.
fn ordered_ids(inserted: HashMap<usize, Bson>) -> Vec<Bson> {
    let mut ids: Vec<_> = inserted.into_iter().collect();
    ids.sort_by_key(|(index, _)| *index);
    ids.into_iter().map(|(_, id)| id).collect()
}

fn update_summary(result: UpdateResult) -> UpdateSummary {
    UpdateSummary {
        matched_count: result.matched_count,
        modified_count: result.modified_count,
        upserted_id: result.upserted_id,
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, BackendError> {
        Ok(self
            .client
            .database(database)
            .list_collection_names()
            .filter(Document::new())
            .await?)
    }

    async fn count_documents(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: Option<PageBounds>,
    ) -> Result<u64, BackendError> {
        let collection = self.collection(namespace);
        let action = collection.count_documents(filter);
        let count = match bounds {
            Some(bounds) => action.skip(bounds.skip).limit(bounds.limit).await?,
            None => action.await?,
        };
        Ok(count)
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: PageBounds,
    ) -> Result<Vec<Document>, BackendError> {
        let cursor = self
            .collection(namespace)
            .find(filter)
            .skip(bounds.skip)
            .limit(find_limit(bounds))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self.collection(namespace).find_one(filter).await?)
    }

    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<Vec<Document>, BackendError> {
        let collection = self.collection(namespace);
        let mut action = collection.aggregate(pipeline);
        if let Some(allow) = settings.allow_disk_use {
            action = action.allow_disk_use(allow);
        }
        if let Some(size) = settings.batch_size {
            action = action.batch_size(size);
        }
        let cursor = action.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> Result<InsertOneSummary, BackendError> {
        let result = self.collection(namespace).insert_one(document).await?;
        Ok(InsertOneSummary {
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary, BackendError> {
        let result = self.collection(namespace).insert_many(documents).await?;
        Ok(InsertManySummary {
            inserted_ids: ordered_ids(result.inserted_ids),
        })
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        let result = self
            .collection(namespace)
            .update_one(filter, update)
            .upsert(upsert)
            .await?;
        Ok(update_summary(result))
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        let result = self
            .collection(namespace)
            .update_many(filter, update)
            .upsert(upsert)
            .await?;
        Ok(update_summary(result))
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError> {
        let result = self.collection(namespace).delete_one(filter).await?;
        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError> {
        let result = self.collection(namespace).delete_many(filter).await?;
        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self
            .collection(namespace)
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .upsert(upsert)
            .await?)
    }

    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self
            .collection(namespace)
            .find_one_and_replace(filter, replacement)
            .return_document(ReturnDocument::After)
            .upsert(upsert)
            .await?)
    }

    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self.collection(namespace).find_one_and_delete(filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A client that never connects: the driver only dials on first use.
    async fn offline_store() -> MongoStore {
        let uri = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";
        let mut options = ClientOptions::parse(uri).await.unwrap();
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        MongoStore::from_client(Client::with_options(options).unwrap())
    }

    #[test]
    fn test_find_limit_saturates() {
        let bounds = PageBounds { skip: 0, limit: 10 };
        assert_eq!(find_limit(bounds), 10);

        let bounds = PageBounds {
            skip: 0,
            limit: u64::MAX,
        };
        assert_eq!(find_limit(bounds), i64::MAX);
    }

    #[test]
    fn test_ordered_ids_follow_input_index() {
        let inserted = HashMap::from([
            (2, Bson::Int32(30)),
            (0, Bson::Int32(10)),
            (1, Bson::Int32(20)),
        ]);
        assert_eq!(
            ordered_ids(inserted),
            vec![Bson::Int32(10), Bson::Int32(20), Bson::Int32(30)]
        );
        assert!(ordered_ids(HashMap::new()).is_empty());
    }

    #[tokio::test]
    async fn test_collection_targets_namespace() {
        let store = offline_store().await;
        let collection = store.collection(&Namespace::new("shop", "orders"));
        assert_eq!(collection.namespace().to_string(), "shop.orders");
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_driver_error() {
        let store = offline_store().await;
        let namespace = Namespace::new("shop", "orders");

        let err = store
            .count_documents(&namespace, Document::new(), Some(PageBounds::default()))
            .await
            .unwrap_err();
        assert!(!err.message.is_empty());

        let settings = AggregateSettings {
            allow_disk_use: Some(true),
            batch_size: Some(5),
        };
        let err = store
            .aggregate(&namespace, vec![doc! { "$match": {} }], settings)
            .await
            .unwrap_err();
        assert!(!err.message.is_empty());

        let err = store
            .find_one_and_update(&namespace, doc! {}, doc! { "$set": { "a": 1 } }, true)
            .await
            .unwrap_err();
        assert!(!err.message.is_empty());
    }
}

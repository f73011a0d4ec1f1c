//! Read operations: always registered.

use super::{Operation, OperationId, schema};
use crate::context::Database;
use crate::error::OperationError;
use crate::options::PageBounds;
use crate::shaping::{CollectionsOutput, CountOutput, DocumentOutput, DocumentsPage};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListCollectionsInput {
    pub database_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountDocumentsInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindOneInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

operation_input!(ListCollectionsInput, CountDocumentsInput, FindOneInput, FindInput);

/// List the collection names of a database.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCollections;

#[async_trait]
impl Operation for ListCollections {
    const ID: OperationId = OperationId::ListCollections;

    type Input = ListCollectionsInput;
    type Output = CollectionsOutput;

    fn description(&self) -> &'static str {
        "List all collections in a MongoDB database."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(vec![], &[])
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "collections",
            json!({
                "type": "array",
                "items": { "type": "string" },
                "description": "The list of collections in the database"
            }),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        _input: ListCollectionsInput,
    ) -> Result<CollectionsOutput, OperationError> {
        let collections = db.list_collection_names().await?;
        Ok(CollectionsOutput { collections })
    }
}

/// Count the documents matching a filter, within an optional window.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountDocuments;

#[async_trait]
impl Operation for CountDocuments {
    const ID: OperationId = OperationId::CountDocuments;

    type Input = CountDocumentsInput;
    type Output = CountOutput;

    fn description(&self) -> &'static str {
        "Count the number of documents in a MongoDB collection that match a given filter."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                ("filter", schema::filter()),
                ("skip", schema::skip()),
                ("limit", schema::limit()),
            ],
            &["collection_name"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "count",
            json!({
                "type": "integer",
                "minimum": 0,
                "description": "The number of documents that match the filter"
            }),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: CountDocumentsInput,
    ) -> Result<CountOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let bounds = PageBounds::resolve(input.skip, input.limit);

        let count = collection
            .count_documents(input.filter.unwrap_or_default(), Some(bounds))
            .await?;
        Ok(CountOutput { count })
    }
}

/// Fetch the first document matching a filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOne;

#[async_trait]
impl Operation for FindOne {
    const ID: OperationId = OperationId::FindOne;

    type Input = FindOneInput;
    type Output = DocumentOutput;

    fn description(&self) -> &'static str {
        "Find a single document in a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                ("filter", schema::filter()),
            ],
            &["collection_name"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "document",
            schema::document("The document found in the collection"),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: FindOneInput,
    ) -> Result<DocumentOutput, OperationError> {
        let collection = db.collection(&input.collection_name);

        collection
            .find_one(input.filter.unwrap_or_default())
            .await?
            .map(DocumentOutput::from)
            .ok_or(OperationError::NotFound)
    }
}

/// Fetch one page of documents plus the full match count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Find;

#[async_trait]
impl Operation for Find {
    const ID: OperationId = OperationId::Find;

    type Input = FindInput;
    type Output = DocumentsPage;

    fn description(&self) -> &'static str {
        "Find multiple documents in a MongoDB collection. Returns one page of \
         results (10 by default) together with the total number of matches and \
         whether more pages exist."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                ("filter", schema::filter()),
                ("skip", schema::skip()),
                ("limit", schema::limit()),
            ],
            &["collection_name"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![
            (
                "documents",
                schema::documents("The documents found in the collection"),
            ),
            (
                "total",
                json!({
                    "type": "integer",
                    "minimum": 0,
                    "description": "The total number of documents that match the filter"
                }),
            ),
            (
                "has_more",
                json!({
                    "type": "boolean",
                    "description": "Whether there are more documents to find"
                }),
            ),
        ])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: FindInput,
    ) -> Result<DocumentsPage, OperationError> {
        let collection = db.collection(&input.collection_name);
        let bounds = PageBounds::resolve(input.skip, input.limit);
        let filter = input.filter.unwrap_or_default();

        let total = collection.count_documents(filter.clone(), None).await?;
        let documents = collection.find(filter, bounds).await?;

        Ok(DocumentsPage::new(documents, total, bounds))
    }
}

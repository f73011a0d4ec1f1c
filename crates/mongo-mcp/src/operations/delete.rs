//! Delete operations: registered unless the server is read-only.

use super::{Operation, OperationId, schema};
use crate::context::Database;
use crate::error::OperationError;
use crate::shaping::{DeleteOutput, DocumentOutput};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
}

operation_input!(DeleteInput);

fn delete_input_schema() -> Value {
    schema::input_object(
        vec![
            ("collection_name", schema::collection_name()),
            ("filter", schema::filter()),
        ],
        &["collection_name"],
    )
}

fn delete_output_schema() -> Value {
    schema::output_object(vec![(
        "result",
        schema::output_object(vec![(
            "deleted_count",
            json!({ "type": "integer", "minimum": 0 }),
        )]),
    )])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOne;

#[async_trait]
impl Operation for DeleteOne {
    const ID: OperationId = OperationId::DeleteOne;

    type Input = DeleteInput;
    type Output = DeleteOutput;

    fn description(&self) -> &'static str {
        "Delete the first document matching a filter from a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        delete_input_schema()
    }

    fn output_schema(&self) -> Value {
        delete_output_schema()
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: DeleteInput,
    ) -> Result<DeleteOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection
            .delete_one(input.filter.unwrap_or_default())
            .await?;
        Ok(summary.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteMany;

#[async_trait]
impl Operation for DeleteMany {
    const ID: OperationId = OperationId::DeleteMany;

    type Input = DeleteInput;
    type Output = DeleteOutput;

    fn description(&self) -> &'static str {
        "Delete every document matching a filter from a MongoDB collection. An \
         empty filter deletes all documents."
    }

    fn input_schema(&self) -> Value {
        delete_input_schema()
    }

    fn output_schema(&self) -> Value {
        delete_output_schema()
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: DeleteInput,
    ) -> Result<DeleteOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection
            .delete_many(input.filter.unwrap_or_default())
            .await?;
        Ok(summary.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindOneAndDelete;

#[async_trait]
impl Operation for FindOneAndDelete {
    const ID: OperationId = OperationId::FindOneAndDelete;

    type Input = DeleteInput;
    type Output = DocumentOutput;

    fn description(&self) -> &'static str {
        "Find one document in a MongoDB collection and delete it. Returns the \
         deleted document."
    }

    fn input_schema(&self) -> Value {
        delete_input_schema()
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "document",
            schema::document("The document that was deleted from the collection"),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: DeleteInput,
    ) -> Result<DocumentOutput, OperationError> {
        let collection = db.collection(&input.collection_name);

        collection
            .find_one_and_delete(input.filter.unwrap_or_default())
            .await?
            .map(DocumentOutput::from)
            .ok_or(OperationError::NotFound)
    }
}

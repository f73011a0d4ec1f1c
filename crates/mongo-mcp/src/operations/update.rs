//! Update and replace operations: registered unless the server is read-only.
//!
//! The find-and-modify variants return the document as it is after the
//! change. With `upsert` off and nothing matching they fail with
//! [`OperationError::NotFound`].

use super::{Operation, OperationId, schema};
use crate::context::Database;
use crate::error::OperationError;
use crate::options::resolve_upsert;
use crate::shaping::{DocumentOutput, UpdateOutput};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{Value, json};

/// Input shared by `update_one`, `update_many` and `find_one_and_update`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
    pub update: Document,
    pub upsert: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub filter: Option<Document>,
    pub replacement: Document,
    pub upsert: Option<bool>,
}

operation_input!(UpdateInput, ReplaceInput);

fn update_input_schema() -> Value {
    schema::input_object(
        vec![
            ("collection_name", schema::collection_name()),
            ("filter", schema::filter()),
            (
                "update",
                schema::document("The update to apply, e.g. {\"$set\": {...}}"),
            ),
            ("upsert", schema::upsert()),
        ],
        &["collection_name", "update"],
    )
}

fn update_output_schema() -> Value {
    schema::output_object(vec![(
        "result",
        schema::output_object(vec![
            (
                "matched_count",
                json!({ "type": "integer", "minimum": 0 }),
            ),
            (
                "modified_count",
                json!({ "type": "integer", "minimum": 0 }),
            ),
            (
                "upserted_id",
                schema::identifier("The _id of the inserted document, or null"),
            ),
        ]),
    )])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOne;

#[async_trait]
impl Operation for UpdateOne {
    const ID: OperationId = OperationId::UpdateOne;

    type Input = UpdateInput;
    type Output = UpdateOutput;

    fn description(&self) -> &'static str {
        "Update the first document matching a filter in a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        update_input_schema()
    }

    fn output_schema(&self) -> Value {
        update_output_schema()
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: UpdateInput,
    ) -> Result<UpdateOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection
            .update_one(
                input.filter.unwrap_or_default(),
                input.update,
                resolve_upsert(input.upsert),
            )
            .await?;
        Ok(summary.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateMany;

#[async_trait]
impl Operation for UpdateMany {
    const ID: OperationId = OperationId::UpdateMany;

    type Input = UpdateInput;
    type Output = UpdateOutput;

    fn description(&self) -> &'static str {
        "Update every document matching a filter in a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        update_input_schema()
    }

    fn output_schema(&self) -> Value {
        update_output_schema()
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: UpdateInput,
    ) -> Result<UpdateOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection
            .update_many(
                input.filter.unwrap_or_default(),
                input.update,
                resolve_upsert(input.upsert),
            )
            .await?;
        Ok(summary.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindOneAndUpdate;

#[async_trait]
impl Operation for FindOneAndUpdate {
    const ID: OperationId = OperationId::FindOneAndUpdate;

    type Input = UpdateInput;
    type Output = DocumentOutput;

    fn description(&self) -> &'static str {
        "Find one document in a MongoDB collection and update it. Returns the \
         updated document."
    }

    fn input_schema(&self) -> Value {
        update_input_schema()
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "document",
            schema::document("The document that was updated in the collection"),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: UpdateInput,
    ) -> Result<DocumentOutput, OperationError> {
        let collection = db.collection(&input.collection_name);

        collection
            .find_one_and_update(
                input.filter.unwrap_or_default(),
                input.update,
                resolve_upsert(input.upsert),
            )
            .await?
            .map(DocumentOutput::from)
            .ok_or(OperationError::NotFound)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FindOneAndReplace;

#[async_trait]
impl Operation for FindOneAndReplace {
    const ID: OperationId = OperationId::FindOneAndReplace;

    type Input = ReplaceInput;
    type Output = DocumentOutput;

    fn description(&self) -> &'static str {
        "Find one document in a MongoDB collection and replace it. Returns the \
         replacement as stored."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                ("filter", schema::filter()),
                (
                    "replacement",
                    schema::document("The document to replace the existing document with"),
                ),
                ("upsert", schema::upsert()),
            ],
            &["collection_name", "replacement"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "document",
            schema::document("The document that was replaced in the collection"),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: ReplaceInput,
    ) -> Result<DocumentOutput, OperationError> {
        let collection = db.collection(&input.collection_name);

        collection
            .find_one_and_replace(
                input.filter.unwrap_or_default(),
                input.replacement,
                resolve_upsert(input.upsert),
            )
            .await?
            .map(DocumentOutput::from)
            .ok_or(OperationError::NotFound)
    }
}

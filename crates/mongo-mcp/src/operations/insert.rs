//! Insert operations: registered unless the server is read-only.

use super::{Operation, OperationId, schema};
use crate::context::Database;
use crate::error::OperationError;
use crate::shaping::{InsertManyOutput, InsertOneOutput};
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertOneInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub document: Document,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertManyInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub documents: Vec<Document>,
}

operation_input!(InsertOneInput, InsertManyInput);

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertOne;

#[async_trait]
impl Operation for InsertOne {
    const ID: OperationId = OperationId::InsertOne;

    type Input = InsertOneInput;
    type Output = InsertOneOutput;

    fn description(&self) -> &'static str {
        "Insert a single document into a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                (
                    "document",
                    schema::document("The document to insert into the collection"),
                ),
            ],
            &["collection_name", "document"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "result",
            schema::output_object(vec![(
                "inserted_id",
                schema::identifier("The _id of the inserted document"),
            )]),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: InsertOneInput,
    ) -> Result<InsertOneOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection.insert_one(input.document).await?;
        Ok(summary.into())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertMany;

#[async_trait]
impl Operation for InsertMany {
    const ID: OperationId = OperationId::InsertMany;

    type Input = InsertManyInput;
    type Output = InsertManyOutput;

    fn description(&self) -> &'static str {
        "Insert many documents into a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                (
                    "documents",
                    schema::documents("The documents to insert into the collection"),
                ),
            ],
            &["collection_name", "documents"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "result",
            schema::output_object(vec![(
                "inserted_ids",
                serde_json::json!({
                    "type": "array",
                    "description": "The _id of each inserted document, in input order"
                }),
            )]),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: InsertManyInput,
    ) -> Result<InsertManyOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let summary = collection.insert_many(input.documents).await?;
        Ok(summary.into())
    }
}

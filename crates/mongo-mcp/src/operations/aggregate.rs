//! Aggregation pipeline: registered only when aggregates are allowed.

use super::{Operation, OperationId, schema};
use crate::context::Database;
use crate::error::OperationError;
use crate::options::AggregateSettings;
use crate::shaping::AggregateOutput;
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregateInput {
    pub database_name: Option<String>,
    pub collection_name: String,
    pub pipeline: Vec<Document>,
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<i32>,
}

operation_input!(AggregateInput);

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregate;

#[async_trait]
impl Operation for Aggregate {
    const ID: OperationId = OperationId::Aggregate;

    type Input = AggregateInput;
    type Output = AggregateOutput;

    fn description(&self) -> &'static str {
        "Run an aggregation pipeline on a MongoDB collection."
    }

    fn input_schema(&self) -> Value {
        schema::input_object(
            vec![
                ("collection_name", schema::collection_name()),
                (
                    "pipeline",
                    schema::documents("The aggregation pipeline stages, in order"),
                ),
                (
                    "allow_disk_use",
                    json!({
                        "type": "boolean",
                        "description": "Optional flag to allow disk use for the aggregation"
                    }),
                ),
                (
                    "batch_size",
                    json!({
                        "type": "integer",
                        "description": "Optional cursor batch size for the aggregation"
                    }),
                ),
            ],
            &["collection_name", "pipeline"],
        )
    }

    fn output_schema(&self) -> Value {
        schema::output_object(vec![(
            "result",
            schema::documents("The documents produced by the pipeline"),
        )])
    }

    async fn execute(
        &self,
        db: Database<'_>,
        input: AggregateInput,
    ) -> Result<AggregateOutput, OperationError> {
        let collection = db.collection(&input.collection_name);
        let settings = AggregateSettings::resolve(input.allow_disk_use, input.batch_size);

        let documents = collection.aggregate(input.pipeline, settings).await?;
        Ok(documents.into())
    }
}

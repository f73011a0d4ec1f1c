//! Output envelopes returned by the operations.
//!
//! Backend results are normalised here into one serialisable shape per
//! operation. Documents and identifiers leave as relaxed extended JSON, so
//! an `ObjectId` reads `{"$oid": "..."}` and plain numbers stay numbers.

use crate::backend::{DeleteSummary, InsertManySummary, InsertOneSummary, UpdateSummary};
use crate::options::PageBounds;
use mongodb::bson::{Bson, Document};
use serde::Serialize;
use serde_json::Value;

/// Render a BSON value as relaxed extended JSON.
pub fn bson_to_json(value: Bson) -> Value {
    value.into_relaxed_extjson()
}

/// Render a document as a relaxed extended JSON object.
pub fn document_to_json(document: Document) -> Value {
    bson_to_json(Bson::Document(document))
}

fn documents_to_json(documents: Vec<Document>) -> Vec<Value> {
    documents.into_iter().map(document_to_json).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionsOutput {
    pub collections: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountOutput {
    pub count: u64,
}

/// A single document returned by `find_one` and the find-and-modify family.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutput {
    pub document: Value,
}

impl From<Document> for DocumentOutput {
    fn from(document: Document) -> Self {
        Self {
            document: document_to_json(document),
        }
    }
}

/// One page of `find` results.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentsPage {
    pub documents: Vec<Value>,
    /// Matches for the filter, ignoring skip and limit.
    pub total: u64,
    pub has_more: bool,
}

impl DocumentsPage {
    pub fn new(documents: Vec<Document>, total: u64, bounds: PageBounds) -> Self {
        let has_more = bounds.has_more(documents.len(), total);
        Self {
            documents: documents_to_json(documents),
            total,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateOutput {
    pub result: Vec<Value>,
}

impl From<Vec<Document>> for AggregateOutput {
    fn from(documents: Vec<Document>) -> Self {
        Self {
            result: documents_to_json(documents),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertOneOutput {
    pub result: InsertOneResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertOneResult {
    pub inserted_id: Value,
}

impl From<InsertOneSummary> for InsertOneOutput {
    fn from(summary: InsertOneSummary) -> Self {
        Self {
            result: InsertOneResult {
                inserted_id: bson_to_json(summary.inserted_id),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertManyOutput {
    pub result: InsertManyResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertManyResult {
    pub inserted_ids: Vec<Value>,
}

impl From<InsertManySummary> for InsertManyOutput {
    fn from(summary: InsertManySummary) -> Self {
        Self {
            result: InsertManyResult {
                inserted_ids: summary.inserted_ids.into_iter().map(bson_to_json).collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutput {
    pub result: UpdateResult,
}

/// Update counts exactly as the backend reported them.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    /// `null` unless the update inserted a document.
    pub upserted_id: Option<Value>,
}

impl From<UpdateSummary> for UpdateOutput {
    fn from(summary: UpdateSummary) -> Self {
        Self {
            result: UpdateResult {
                matched_count: summary.matched_count,
                modified_count: summary.modified_count,
                upserted_id: summary.upserted_id.map(bson_to_json),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutput {
    pub result: DeleteResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

impl From<DeleteSummary> for DeleteOutput {
    fn from(summary: DeleteSummary) -> Self {
        Self {
            result: DeleteResult {
                deleted_count: summary.deleted_count,
            },
        }
    }
}

//! Shared test infrastructure for the mongo-mcp integration tests.
//!
//! This module provides:
//! - an in-memory `DocumentStore` with call counting and failure injection
//! - helpers to build contexts, registries and servers around it
//! - output schema assertions

#![allow(dead_code)]

use async_trait::async_trait;
use mongo_mcp::backend::{
    DeleteSummary, DocumentStore, InsertManySummary, InsertOneSummary, Namespace, UpdateSummary,
};
use mongo_mcp::options::{AggregateSettings, PageBounds};
use mongo_mcp::{BackendError, ConnectionContext, McpServer, OperationRegistry};
use mongo_mcp::{JsonRpcRequest, JsonRpcResponse};
use mongo_mcp_core::{Capabilities, McpConfig};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DATABASE: &str = "shop";

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// A `DocumentStore` over plain vectors.
///
/// Filters support top-level equality only. Updates support `$set` and
/// `$inc`. Pipelines support `$match`, `$skip` and `$limit`.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Namespace, Vec<Document>>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    last_aggregate: Mutex<Option<AggregateSettings>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, collection: &str, documents: Vec<Document>) {
        self.collections
            .lock()
            .unwrap()
            .entry(Namespace::new(DATABASE, collection))
            .or_default()
            .extend(documents);
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(&Namespace::new(database, collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of backend calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Make every following call sleep before answering.
    pub fn delay_by(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn last_aggregate(&self) -> Option<AggregateSettings> {
        *self.last_aggregate.lock().unwrap()
    }

    async fn enter(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(BackendError::new(message)),
            None => Ok(()),
        }
    }

    fn with_collection<T>(
        &self,
        namespace: &Namespace,
        f: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> T {
        let mut collections = self.collections.lock().unwrap();
        f(collections.entry(namespace.clone()).or_default())
    }

    fn update_matching(
        &self,
        namespace: &Namespace,
        filter: &Document,
        update: &Document,
        upsert: bool,
        many: bool,
    ) -> Result<(UpdateSummary, Option<Document>), BackendError> {
        self.with_collection(namespace, |docs| {
            let mut matched = 0;
            let mut modified = 0;
            let mut first = None;
            for doc in docs.iter_mut().filter(|d| matches(d, filter)) {
                matched += 1;
                let updated = apply_update(doc, update)?;
                if updated != *doc {
                    modified += 1;
                    *doc = updated;
                }
                if first.is_none() {
                    first = Some(doc.clone());
                }
                if !many {
                    break;
                }
            }

            let mut upserted_id = None;
            if matched == 0 && upsert {
                let mut seeded = equality_fields(filter);
                seeded = apply_update(&seeded, update)?;
                let id = ensure_id(&mut seeded);
                docs.push(seeded.clone());
                upserted_id = Some(id);
                first = Some(seeded);
            }

            Ok((
                UpdateSummary {
                    matched_count: matched,
                    modified_count: modified,
                    upserted_id,
                },
                first,
            ))
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, BackendError> {
        self.enter().await?;
        let mut names: Vec<String> = self
            .collections
            .lock()
            .unwrap()
            .keys()
            .filter(|ns| ns.database == database)
            .map(|ns| ns.collection.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn count_documents(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: Option<PageBounds>,
    ) -> Result<u64, BackendError> {
        self.enter().await?;
        let matching = self.with_collection(namespace, |docs| {
            docs.iter().filter(|d| matches(d, &filter)).count() as u64
        });
        Ok(match bounds {
            Some(bounds) => matching.saturating_sub(bounds.skip).min(bounds.limit),
            None => matching,
        })
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        bounds: PageBounds,
    ) -> Result<Vec<Document>, BackendError> {
        self.enter().await?;
        Ok(self.with_collection(namespace, |docs| {
            docs.iter()
                .filter(|d| matches(d, &filter))
                .skip(bounds.skip as usize)
                .take(bounds.limit as usize)
                .cloned()
                .collect()
        }))
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        self.enter().await?;
        Ok(self.with_collection(namespace, |docs| {
            docs.iter().find(|d| matches(d, &filter)).cloned()
        }))
    }

    async fn aggregate(
        &self,
        namespace: &Namespace,
        pipeline: Vec<Document>,
        settings: AggregateSettings,
    ) -> Result<Vec<Document>, BackendError> {
        self.enter().await?;
        *self.last_aggregate.lock().unwrap() = Some(settings);

        let mut docs = self.with_collection(namespace, |docs| docs.clone());
        for stage in &pipeline {
            let (name, arg) = stage
                .iter()
                .next()
                .ok_or_else(|| BackendError::new("empty pipeline stage"))?;
            docs = match (name.as_str(), arg) {
                ("$match", Bson::Document(filter)) => {
                    docs.into_iter().filter(|d| matches(d, filter)).collect()
                }
                ("$skip", n) => docs.into_iter().skip(as_count(n)?).collect(),
                ("$limit", n) => docs.into_iter().take(as_count(n)?).collect(),
                (other, _) => {
                    return Err(BackendError::new(format!(
                        "Unrecognized pipeline stage name: '{other}'"
                    )));
                }
            };
        }
        Ok(docs)
    }

    async fn insert_one(
        &self,
        namespace: &Namespace,
        mut document: Document,
    ) -> Result<InsertOneSummary, BackendError> {
        self.enter().await?;
        let inserted_id = ensure_id(&mut document);
        self.with_collection(namespace, |docs| {
            if docs.iter().any(|d| d.get("_id") == Some(&inserted_id)) {
                return Err(BackendError::new("E11000 duplicate key error"));
            }
            docs.push(document);
            Ok(InsertOneSummary { inserted_id })
        })
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary, BackendError> {
        self.enter().await?;
        self.with_collection(namespace, |docs| {
            let mut inserted_ids = Vec::with_capacity(documents.len());
            for mut document in documents {
                let id = ensure_id(&mut document);
                if docs.iter().any(|d| d.get("_id") == Some(&id)) {
                    return Err(BackendError::new("E11000 duplicate key error"));
                }
                docs.push(document);
                inserted_ids.push(id);
            }
            Ok(InsertManySummary { inserted_ids })
        })
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        self.enter().await?;
        self.update_matching(namespace, &filter, &update, upsert, false)
            .map(|(summary, _)| summary)
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<UpdateSummary, BackendError> {
        self.enter().await?;
        self.update_matching(namespace, &filter, &update, upsert, true)
            .map(|(summary, _)| summary)
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError> {
        self.enter().await?;
        let deleted = self.with_collection(namespace, |docs| {
            match docs.iter().position(|d| matches(d, &filter)) {
                Some(i) => {
                    docs.remove(i);
                    1
                }
                None => 0,
            }
        });
        Ok(DeleteSummary {
            deleted_count: deleted,
        })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<DeleteSummary, BackendError> {
        self.enter().await?;
        let deleted = self.with_collection(namespace, |docs| {
            let before = docs.len();
            docs.retain(|d| !matches(d, &filter));
            (before - docs.len()) as u64
        });
        Ok(DeleteSummary {
            deleted_count: deleted,
        })
    }

    async fn find_one_and_update(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        self.enter().await?;
        self.update_matching(namespace, &filter, &update, upsert, false)
            .map(|(_, document)| document)
    }

    async fn find_one_and_replace(
        &self,
        namespace: &Namespace,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> Result<Option<Document>, BackendError> {
        self.enter().await?;
        if replacement.keys().any(|k| k.starts_with('$')) {
            return Err(BackendError::new(
                "replacement document must not contain update operators",
            ));
        }
        self.with_collection(namespace, |docs| {
            if let Some(doc) = docs.iter_mut().find(|d| matches(d, &filter)) {
                let mut replaced = replacement.clone();
                if let Some(id) = doc.get("_id") {
                    replaced.insert("_id", id.clone());
                }
                *doc = replaced.clone();
                return Ok(Some(replaced));
            }
            if upsert {
                let mut seeded = equality_fields(&filter);
                for (key, value) in replacement {
                    seeded.insert(key, value);
                }
                ensure_id(&mut seeded);
                docs.push(seeded.clone());
                return Ok(Some(seeded));
            }
            Ok(None)
        })
    }

    async fn find_one_and_delete(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        self.enter().await?;
        Ok(self.with_collection(namespace, |docs| {
            docs.iter()
                .position(|d| matches(d, &filter))
                .map(|i| docs.remove(i))
        }))
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        document
            .get(key)
            .is_some_and(|actual| values_equal(actual, expected))
    })
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Numbers compare by value regardless of their BSON width.
fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_count(value: &Bson) -> Result<usize, BackendError> {
    as_f64(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n as usize)
        .ok_or_else(|| BackendError::new("stage argument must be a non-negative number"))
}

fn equality_fields(filter: &Document) -> Document {
    filter
        .iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn ensure_id(document: &mut Document) -> Bson {
    if let Some(id) = document.get("_id") {
        return id.clone();
    }
    let id = Bson::ObjectId(ObjectId::new());
    document.insert("_id", id.clone());
    id
}

fn apply_update(document: &Document, update: &Document) -> Result<Document, BackendError> {
    let mut updated = document.clone();
    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(BackendError::new(format!(
                "Modifiers operate on fields but we found type {:?} instead",
                fields.element_type()
            )));
        };
        match operator.as_str() {
            "$set" => {
                for (key, value) in fields {
                    updated.insert(key.clone(), value.clone());
                }
            }
            "$inc" => {
                for (key, by) in fields {
                    let next = match (updated.get(key), by) {
                        (None, by) => by.clone(),
                        (Some(Bson::Int32(a)), Bson::Int32(b)) => Bson::Int32(a + b),
                        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a + b),
                        (Some(a), b) => match (as_f64(a), as_f64(b)) {
                            (Some(x), Some(y)) if x.fract() == 0.0 && y.fract() == 0.0 => {
                                Bson::Int64((x + y) as i64)
                            }
                            (Some(x), Some(y)) => Bson::Double(x + y),
                            _ => {
                                return Err(BackendError::new(
                                    "Cannot apply $inc to a value of non-numeric type",
                                ));
                            }
                        },
                    };
                    updated.insert(key.clone(), next);
                }
            }
            other => {
                return Err(BackendError::new(format!(
                    "Unknown modifier: {other}. Expected a valid update modifier"
                )));
            }
        }
    }
    Ok(updated)
}

// =============================================================================
// CONTEXT / SERVER HELPERS
// =============================================================================

pub fn context(store: &Arc<MemoryStore>, default_database: Option<&str>) -> ConnectionContext {
    context_with(store, default_database, Capabilities::new(false, true))
}

pub fn context_with(
    store: &Arc<MemoryStore>,
    default_database: Option<&str>,
    capabilities: Capabilities,
) -> ConnectionContext {
    ConnectionContext::new(
        store.clone(),
        default_database.map(str::to_string),
        capabilities,
    )
}

pub fn server(store: &Arc<MemoryStore>, capabilities: Capabilities) -> Arc<McpServer> {
    server_with_config(store, capabilities, McpConfig::default())
}

pub fn server_with_config(
    store: &Arc<MemoryStore>,
    capabilities: Capabilities,
    config: McpConfig,
) -> Arc<McpServer> {
    let context = context_with(store, Some(DATABASE), capabilities);
    let registry = OperationRegistry::from_capabilities(capabilities).unwrap();
    Arc::new(McpServer::new(config, context, registry))
}

pub fn call_request(id: i64, tool: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(
        Some(Value::from(id)),
        "tools/call",
        Some(serde_json::json!({ "name": tool, "arguments": arguments })),
    )
}

/// Call a tool through the adapter and return the JSON-RPC response.
pub async fn call(server: &McpServer, tool: &str, arguments: Value) -> JsonRpcResponse {
    server
        .handle_request(call_request(1, tool, arguments))
        .await
        .expect("tools/call always answers")
}

/// The `structuredContent` of a successful call.
pub fn structured(response: &JsonRpcResponse) -> Value {
    let result = response.result.as_ref().expect("expected a result");
    assert_eq!(result["isError"], false, "tool failed: {result}");
    result["structuredContent"].clone()
}

/// The text of a failed call.
pub fn tool_error(response: &JsonRpcResponse) -> String {
    let result = response.result.as_ref().expect("expected a result");
    assert_eq!(result["isError"], true, "tool succeeded: {result}");
    result["content"][0]["text"]
        .as_str()
        .expect("error text")
        .to_string()
}

// =============================================================================
// SCHEMA HELPERS
// =============================================================================

/// Assert that `instance` satisfies `schema`.
pub fn assert_matches_schema(schema: &Value, instance: &Value, what: &str) {
    let validator = jsonschema::validator_for(schema).expect("schema must compile");
    if !validator.is_valid(instance) {
        let msgs: Vec<String> = validator
            .iter_errors(instance)
            .take(20)
            .map(|err| err.to_string())
            .collect();
        panic!("{what} did not validate: {}", msgs.join("; "));
    }
}

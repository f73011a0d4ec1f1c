//! JSON Schema fragments shared by the operation contracts.

use serde_json::{Map, Value, json};

pub fn database_name() -> Value {
    json!({
        "type": "string",
        "description": "Optional name of the database; falls back to the configured default"
    })
}

pub fn collection_name() -> Value {
    json!({
        "type": "string",
        "description": "Name of the collection"
    })
}

pub fn filter() -> Value {
    json!({
        "type": "object",
        "description": "Query filter selecting documents; defaults to {} (all documents)"
    })
}

pub fn document(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description
    })
}

pub fn documents(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "object" },
        "description": description
    })
}

pub fn upsert() -> Value {
    json!({
        "type": "boolean",
        "description": "Insert a document when nothing matches the filter, defaults to false"
    })
}

pub fn skip() -> Value {
    json!({
        "type": "integer",
        "description": "Optional number of documents to skip, defaults to 0"
    })
}

pub fn limit() -> Value {
    json!({
        "type": "integer",
        "description": "Optional maximum number of documents, defaults to 10"
    })
}

/// Any BSON value rendered as extended JSON (`_id` values and friends).
pub fn identifier(description: &str) -> Value {
    json!({ "description": description })
}

/// Object schema with the given properties; `database_name` is always added.
pub fn input_object(properties: Vec<(&str, Value)>, required: &[&str]) -> Value {
    let mut props = Map::new();
    props.insert("database_name".to_string(), database_name());
    for (name, schema) in properties {
        props.insert(name.to_string(), schema);
    }
    json!({
        "type": "object",
        "properties": props,
        "required": required,
        "additionalProperties": false
    })
}

/// Object schema for an output envelope; every property is required.
pub fn output_object(properties: Vec<(&str, Value)>) -> Value {
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
    let props: Map<String, Value> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_object_always_has_database_name() {
        let schema = input_object(
            vec![("collection_name", collection_name())],
            &["collection_name"],
        );
        assert!(schema["properties"]["database_name"].is_object());
        assert_eq!(schema["required"], json!(["collection_name"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_output_object_requires_all() {
        let schema = output_object(vec![("count", json!({"type": "integer"}))]);
        assert_eq!(schema["required"], json!(["count"]));
    }
}

//! Rendering of stored documents as plain JSON: object ids become hex strings, dates RFC 3339.

use bson::{Bson, Document};
use serde_json::{Map, Number, Value};

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(date) => Value::String(date.to_chrono().to_rfc3339()),
        Bson::Double(number) => Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::Int32(number) => Value::from(number),
        Bson::Int64(number) => Value::from(number),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(document) => document_to_json(document),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn documents_to_json(documents: Vec<Document>) -> Vec<Value> {
    documents.into_iter().map(document_to_json).collect()
}

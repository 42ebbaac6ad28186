//! Firestore v1 REST wire format.
//!
//! Values travel as single-key typed objects (`{"stringValue": "x"}`,
//! `{"integerValue": "42"}`, `{"mapValue": {"fields": {...}}}`), documents
//! as `{ "name": "<resource path>", "fields": {...} }`.

use crate::codec::{format_timestamp, parse_instant};
use crate::common::{Document, SortOrder, Value};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::query::{FieldFilter, Operator, Query};
use crate::store::{DocumentPath, WriteOperation};
use serde_json::{json, Map};

pub(crate) fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::Float(f) => {
            if f.is_nan() {
                json!({ "doubleValue": "NaN" })
            } else if f.is_infinite() {
                let text = if *f > 0.0 { "Infinity" } else { "-Infinity" };
                json!({ "doubleValue": text })
            } else {
                json!({ "doubleValue": f })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<serde_json::Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Map(document) => json!({ "mapValue": { "fields": encode_fields(document) } }),
        Value::Timestamp(instant) => json!({ "timestampValue": format_timestamp(instant) }),
    }
}

pub(crate) fn encode_fields(document: &Document) -> serde_json::Value {
    let fields: Map<String, serde_json::Value> = document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    serde_json::Value::Object(fields)
}

pub(crate) fn decode_value(json: &serde_json::Value) -> StoreResult<Value> {
    let object = json
        .as_object()
        .ok_or_else(|| wire_error("typed value is not an object"))?;
    let (kind, raw) = object
        .iter()
        .next()
        .ok_or_else(|| wire_error("typed value is empty"))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => raw
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| wire_error("booleanValue is not a boolean")),
        "integerValue" => match raw {
            serde_json::Value::String(s) => s
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| wire_error("integerValue is not an integer")),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| wire_error("integerValue is out of range")),
            _ => Err(wire_error("integerValue has an unexpected type")),
        },
        "doubleValue" => match raw {
            serde_json::Value::Number(n) => Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN))),
            serde_json::Value::String(s) => match s.as_str() {
                "NaN" => Ok(Value::Float(f64::NAN)),
                "Infinity" => Ok(Value::Float(f64::INFINITY)),
                "-Infinity" => Ok(Value::Float(f64::NEG_INFINITY)),
                other => other
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| wire_error("doubleValue is not a number")),
            },
            _ => Err(wire_error("doubleValue has an unexpected type")),
        },
        "timestampValue" => raw
            .as_str()
            .and_then(parse_instant)
            .map(Value::timestamp)
            .ok_or_else(|| wire_error("timestampValue is not an RFC 3339 instant")),
        "stringValue" | "referenceValue" | "bytesValue" => raw
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| wire_error("string value is not a string")),
        "geoPointValue" => {
            let mut point = Document::new();
            for axis in ["latitude", "longitude"] {
                let coordinate = raw.get(axis).and_then(|v| v.as_f64()).unwrap_or(0.0);
                point.put(axis, coordinate);
            }
            Ok(Value::Map(point))
        }
        "arrayValue" => {
            let values = match raw.get("values").and_then(|v| v.as_array()) {
                Some(values) => values.iter().map(decode_value).collect::<StoreResult<_>>()?,
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => Ok(Value::Map(decode_fields(raw.get("fields"))?)),
        other => Err(wire_error(&format!("unsupported value type '{}'", other))),
    }
}

pub(crate) fn decode_fields(fields: Option<&serde_json::Value>) -> StoreResult<Document> {
    let mut document = Document::new();
    if let Some(fields) = fields.and_then(|f| f.as_object()) {
        for (key, value) in fields {
            document.put(key, decode_value(value)?);
        }
    }
    Ok(document)
}

/// Decodes a document resource into its id and fields.
pub(crate) fn decode_document(json: &serde_json::Value) -> StoreResult<(String, Document)> {
    let name = json
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| wire_error("document has no name"))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| wire_error("document name has no id"))?;
    Ok((id.to_string(), decode_fields(json.get("fields"))?))
}

/// Decodes the stream of results returned by `documents:runQuery`.
/// Entries without a document (progress markers) are skipped.
pub(crate) fn decode_query_response(
    json: &serde_json::Value,
) -> StoreResult<Vec<(String, Document)>> {
    let entries = json
        .as_array()
        .ok_or_else(|| wire_error("query response is not an array"))?;
    entries
        .iter()
        .filter_map(|entry| entry.get("document"))
        .map(decode_document)
        .collect()
}

/// Quotes one field path segment with backticks unless it is a simple name.
pub(crate) fn quote_segment(segment: &str) -> String {
    let mut chars = segment.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        segment.to_string()
    } else {
        format!("`{}`", segment.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn query_field_path(field: &str) -> String {
    field.split('.').map(quote_segment).collect::<Vec<_>>().join(".")
}

fn operator_name(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "EQUAL",
        Operator::NotEqual => "NOT_EQUAL",
        Operator::GreaterThan => "GREATER_THAN",
        Operator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        Operator::LessThan => "LESS_THAN",
        Operator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
        Operator::ArrayContains => "ARRAY_CONTAINS",
        Operator::In => "IN",
        Operator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
    }
}

fn encode_filter(filter: &FieldFilter) -> serde_json::Value {
    let field = json!({ "fieldPath": query_field_path(filter.field()) });
    match (filter.operator(), filter.value()) {
        (Operator::Equal, Value::Null) => {
            json!({ "unaryFilter": { "op": "IS_NULL", "field": field } })
        }
        (Operator::NotEqual, Value::Null) => {
            json!({ "unaryFilter": { "op": "IS_NOT_NULL", "field": field } })
        }
        (operator, value) => json!({
            "fieldFilter": {
                "field": field,
                "op": operator_name(operator),
                "value": encode_value(value),
            }
        }),
    }
}

/// Builds the `runQuery` request body for one collection.
pub(crate) fn encode_query(collection: &str, query: &Query) -> serde_json::Value {
    let mut structured = Map::new();
    structured.insert("from".to_string(), json!([{ "collectionId": collection }]));

    let filters: Vec<serde_json::Value> = query.filters().iter().map(encode_filter).collect();
    match filters.len() {
        0 => {}
        1 => {
            if let Some(filter) = filters.into_iter().next() {
                structured.insert("where".to_string(), filter);
            }
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some((field, order)) = query.ordering() {
        let direction = match order {
            SortOrder::Ascending => "ASCENDING",
            SortOrder::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".to_string(),
            json!([{ "field": { "fieldPath": query_field_path(field) }, "direction": direction }]),
        );
    }

    json!({ "structuredQuery": structured })
}

/// Encodes one write for `documents:commit`.
///
/// Merging writes carry an update mask of their top-level keys so fields
/// outside the payload are kept, and no existence precondition, so they
/// create missing documents like the local backend does.
pub(crate) fn encode_write(operation: &WriteOperation, documents_root: &str) -> serde_json::Value {
    match operation {
        WriteOperation::Set {
            path,
            data,
            options,
        } => {
            if options.merge {
                encode_masked_update(path, data, documents_root)
            } else {
                json!({
                    "update": {
                        "name": resource_name(documents_root, path),
                        "fields": encode_fields(data),
                    }
                })
            }
        }
        WriteOperation::Update { path, data } => encode_masked_update(path, data, documents_root),
        WriteOperation::Delete { path } => json!({ "delete": resource_name(documents_root, path) }),
    }
}

fn encode_masked_update(path: &DocumentPath, data: &Document, root: &str) -> serde_json::Value {
    let mask: Vec<String> = data.keys().map(|key| quote_segment(key)).collect();
    json!({
        "update": {
            "name": resource_name(root, path),
            "fields": encode_fields(data),
        },
        "updateMask": { "fieldPaths": mask },
    })
}

pub(crate) fn resource_name(documents_root: &str, path: &DocumentPath) -> String {
    format!("{}/{}/{}", documents_root, path.collection(), path.id())
}

fn wire_error(message: &str) -> StoreError {
    StoreError::new(
        &format!("Unexpected remote response: {}", message),
        ErrorKind::BackendError,
    )
}

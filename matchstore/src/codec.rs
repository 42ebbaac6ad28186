//! Conversion between [Value]s and their JSON storage form.
//!
//! Timestamps are stored as a tagged object
//! `{ "__type": "Date", "value": "2024-05-01T10:22:03.125Z" }` so they load
//! back as timestamps instead of plain strings. Every other value maps onto
//! the corresponding JSON value.
//!
//! Decoding never fails on a bad timestamp: an unparseable tagged value is
//! replaced by the current instant and the substitution is recorded in a
//! [DecodeReport] and logged. This is the only place data is silently
//! replaced during a load.

use crate::common::{Document, Value, DATE_TYPE_NAME, TAGGED_VALUE_FIELD, TYPE_TAG};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Number};

/// A tagged timestamp that could not be parsed and was replaced by "now".
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampFallback {
    /// Dotted path of the field inside the decoded document, array
    /// positions included, e.g. `createdAt` or `rounds.2.startedAt`.
    pub path: String,
    /// The raw content of the tagged `value` field.
    pub raw: String,
}

/// Collects the timestamp substitutions made while decoding.
#[derive(Debug, Clone, Default)]
pub struct DecodeReport {
    fallbacks: Vec<TimestampFallback>,
}

impl DecodeReport {
    pub fn new() -> Self {
        DecodeReport::default()
    }

    pub fn fallbacks(&self) -> &[TimestampFallback] {
        &self.fallbacks
    }

    pub fn is_clean(&self) -> bool {
        self.fallbacks.is_empty()
    }

    pub fn into_fallbacks(self) -> Vec<TimestampFallback> {
        self.fallbacks
    }

    fn record(&mut self, path: &str, raw: String) {
        log::warn!(
            "Unparseable timestamp at '{}' ({}), substituting current time",
            path,
            raw
        );
        self.fallbacks.push(TimestampFallback {
            path: path.to_string(),
            raw,
        });
    }
}

/// Encodes a value into its JSON storage form.
///
/// Non-finite floats have no JSON representation and are stored as `null`.
pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(values) => {
            serde_json::Value::Array(values.iter().map(encode_value).collect())
        }
        Value::Map(document) => serde_json::Value::Object(encode_fields(document)),
        Value::Timestamp(instant) => {
            let mut tagged = Map::with_capacity(2);
            tagged.insert(
                TYPE_TAG.to_string(),
                serde_json::Value::String(DATE_TYPE_NAME.to_string()),
            );
            tagged.insert(
                TAGGED_VALUE_FIELD.to_string(),
                serde_json::Value::String(format_timestamp(instant)),
            );
            serde_json::Value::Object(tagged)
        }
    }
}

/// Encodes a document into a JSON object.
pub fn encode_document(document: &Document) -> serde_json::Value {
    serde_json::Value::Object(encode_fields(document))
}

fn encode_fields(document: &Document) -> Map<String, serde_json::Value> {
    document
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// ISO-8601 in UTC with millisecond precision and a `Z` suffix.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decodes a JSON storage value, discarding the substitution report.
pub fn decode_value(json: &serde_json::Value) -> Value {
    let mut report = DecodeReport::new();
    decode_value_tracked(json, "", &mut report)
}

/// Decodes a JSON storage value, recording timestamp substitutions in
/// `report` under paths prefixed with `path`.
pub fn decode_value_tracked(
    json: &serde_json::Value,
    path: &str,
    report: &mut DecodeReport,
) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => decode_number(n),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(values) => Value::Array(
            values
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    decode_value_tracked(item, &child_path(path, &index.to_string()), report)
                })
                .collect(),
        ),
        serde_json::Value::Object(fields) => {
            if is_date_tagged(fields) {
                let raw = fields.get(TAGGED_VALUE_FIELD);
                match raw.and_then(parse_tagged_instant) {
                    Some(instant) => Value::timestamp(instant),
                    None => {
                        let raw = raw.map(|r| r.to_string()).unwrap_or_default();
                        report.record(path, raw);
                        Value::now()
                    }
                }
            } else {
                Value::Map(decode_fields(fields, path, report))
            }
        }
    }
}

/// Decodes a stored document. The input must be a JSON object.
pub fn decode_document(
    json: &serde_json::Value,
    report: &mut DecodeReport,
) -> StoreResult<Document> {
    decode_document_at(json, "", report)
}

/// Same as [decode_document], recording substitutions under `path`.
pub fn decode_document_at(
    json: &serde_json::Value,
    path: &str,
    report: &mut DecodeReport,
) -> StoreResult<Document> {
    match json {
        serde_json::Value::Object(fields) => Ok(decode_fields(fields, path, report)),
        other => Err(StoreError::new(
            &format!(
                "Expected a JSON object for a document, found {}",
                json_type_name(other)
            ),
            ErrorKind::InvalidDocumentShape,
        )),
    }
}

fn decode_fields(
    fields: &Map<String, serde_json::Value>,
    path: &str,
    report: &mut DecodeReport,
) -> Document {
    fields
        .iter()
        .map(|(key, value)| {
            let decoded = decode_value_tracked(value, &child_path(path, key), report);
            (key.clone(), decoded)
        })
        .collect()
}

fn decode_number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn is_date_tagged(fields: &Map<String, serde_json::Value>) -> bool {
    fields
        .get(TYPE_TAG)
        .and_then(|tag| tag.as_str())
        .is_some_and(|tag| tag == DATE_TYPE_NAME)
}

fn parse_tagged_instant(raw: &serde_json::Value) -> Option<DateTime<Utc>> {
    match raw {
        serde_json::Value::String(s) => parse_instant(s),
        // epoch milliseconds
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Parses an instant written as RFC 3339, as a zone-less date-time
/// (taken as UTC) or as a bare date (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

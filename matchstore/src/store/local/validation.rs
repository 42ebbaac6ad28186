use crate::codec::TimestampFallback;
use crate::common::{Document, Value};
use crate::store::DocumentMap;

/// Required fields per known collection kind, with the label used in
/// issue messages.
const REQUIRED_FIELDS: &[(&str, &str, &[&str])] = &[
    ("users", "user", &["discordId", "username"]),
    ("tournaments", "tournament", &["title", "status"]),
    ("entries", "entry", &["tournamentId", "discordId"]),
];

/// Top-level fields whose name contains one of these markers must hold a
/// timestamp.
const TEMPORAL_MARKERS: &[&str] = &["At", "Date"];

/// Checks one collection and appends an issue line per problem.
///
/// - a required field that is missing or falsy:
///   `Invalid user document <id>: missing required fields`
/// - a temporal field holding something other than a timestamp:
///   `Invalid date in <collection>/<id>.<field>`
/// - a timestamp that was unreadable on load and replaced:
///   `Invalid date in <collection>/<path> (unparseable value replaced with load time)`
///
/// Null temporal fields are treated as unset and not reported.
pub(crate) fn validate_collection(
    collection: &str,
    documents: &DocumentMap,
    fallbacks: &[TimestampFallback],
    issues: &mut Vec<String>,
) {
    let required = REQUIRED_FIELDS
        .iter()
        .find(|(name, _, _)| *name == collection);

    for (id, document) in documents {
        if let Some((_, label, fields)) = required {
            if fields.iter().any(|field| !is_present(document, field)) {
                issues.push(format!(
                    "Invalid {} document {}: missing required fields",
                    label, id
                ));
            }
        }

        for (key, value) in document.iter() {
            if is_temporal_field(key) && !value.is_null() && !value.is_timestamp() {
                issues.push(format!("Invalid date in {}/{}.{}", collection, id, key));
            }
        }
    }

    for fallback in fallbacks {
        issues.push(format!(
            "Invalid date in {}/{} (unparseable value replaced with load time)",
            collection, fallback.path
        ));
    }
}

fn is_present(document: &Document, field: &str) -> bool {
    document.get(field).is_some_and(Value::is_truthy)
}

fn is_temporal_field(key: &str) -> bool {
    TEMPORAL_MARKERS.iter().any(|marker| key.contains(marker))
}

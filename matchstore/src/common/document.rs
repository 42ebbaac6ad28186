use crate::common::Value;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// An ordered map of field names to [Value]s.
///
/// Field order is insertion order and survives persistence, so a collection
/// file written after a load keeps the layout it was read with.
///
/// Nested fields are addressed with dotted paths through [Document::resolve],
/// e.g. `"stats.wins"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            fields: IndexMap::new(),
        }
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a top-level field and returns the previous value, if any.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.to_string(), value.into())
    }

    /// Removes a top-level field, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.fields.keys()
    }

    /// Shallow merge: every top-level field of `other` overwrites the field
    /// of the same name in `self`. Fields absent from `other` are kept.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Resolves a dotted field path through nested maps.
    ///
    /// A top-level key that itself contains a dot wins over the nested
    /// interpretation. Returns `None` if any segment is missing or walks into
    /// a non-map value.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_document()?.get(segment)?;
        }
        Some(current)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.fields.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Document {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[doc(hidden)]
pub fn normalize_key(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Builds a [Document] with JSON-like syntax.
///
/// Keys may be identifiers or string literals. Values may be literals,
/// `null`, nested `{ ... }` documents, `[ ... ]` arrays, or any expression
/// wrapped in parentheses.
///
/// ```rust
/// use matchstore::doc;
///
/// let points = 12;
/// let user = doc! {
///     discordId: "123",
///     username: "alice",
///     "display name": "Alice",
///     stats: { wins: 3, points: (points * 2) },
///     roles: ["admin", "player"],
///     bannedAt: null,
/// };
/// assert_eq!(user.resolve("stats.points").and_then(|v| v.as_i64()), Some(24));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::common::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_mut)]
            let mut doc = $crate::common::Document::new();
            $(
                doc.put(&$crate::common::normalize_key(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Converts a single `doc!` value token into a [Value].
#[macro_export]
macro_rules! doc_value {
    (null) => {
        $crate::common::Value::Null
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Map($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

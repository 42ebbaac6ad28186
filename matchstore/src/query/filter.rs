use crate::common::{Document, Value};
use crate::errors::{ErrorKind, StoreError};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Comparison operator of a field filter.
///
/// Displays and parses using the wire spellings (`==`, `array-contains`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    ArrayContains,
    In,
    ArrayContainsAny,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::ArrayContains => "array-contains",
            Operator::In => "in",
            Operator::ArrayContainsAny => "array-contains-any",
        }
    }
}

impl FromStr for Operator {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            "array-contains" => Ok(Operator::ArrayContains),
            "in" => Ok(Operator::In),
            "array-contains-any" => Ok(Operator::ArrayContainsAny),
            other => Err(StoreError::new(
                &format!("Unsupported query operator '{}'", other),
                ErrorKind::FilterError,
            )),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single `(field, operator, value)` predicate.
///
/// The field may be a dotted path into nested maps. A document that does not
/// have the field fails the predicate whatever the operator, including `!=`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    operator: Operator,
    value: Value,
}

impl FieldFilter {
    pub fn new(field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        FieldFilter {
            field: field.to_string(),
            operator,
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Checks the predicate against a decoded document.
    pub fn matches(&self, document: &Document) -> bool {
        let actual = match document.resolve(&self.field) {
            Some(actual) => actual,
            None => return false,
        };

        match self.operator {
            Operator::Equal => actual == &self.value,
            Operator::NotEqual => actual != &self.value,
            Operator::GreaterThan => self.compare_with(actual, |o| o == Ordering::Greater),
            Operator::GreaterThanOrEqual => self.compare_with(actual, |o| o != Ordering::Less),
            Operator::LessThan => self.compare_with(actual, |o| o == Ordering::Less),
            Operator::LessThanOrEqual => self.compare_with(actual, |o| o != Ordering::Greater),
            Operator::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.contains(&self.value)),
            Operator::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.contains(actual)),
            Operator::ArrayContainsAny => match (actual.as_array(), self.value.as_array()) {
                (Some(items), Some(candidates)) => {
                    items.iter().any(|item| candidates.contains(item))
                }
                _ => false,
            },
        }
    }

    // values of different kinds never satisfy a range predicate
    fn compare_with(&self, actual: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        actual.compare(&self.value).is_some_and(accept)
    }
}

impl Display for FieldFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Starts a fluent filter on the given field, e.g. `field("rank").gte(3)`.
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for [FieldFilter]s on one field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::Equal, value)
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::NotEqual, value)
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::GreaterThan, value)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::GreaterThanOrEqual, value)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::LessThan, value)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::LessThanOrEqual, value)
    }

    /// Matches documents whose array field contains `value`.
    #[inline]
    pub fn array_contains<T: Into<Value>>(self, value: T) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::ArrayContains, value)
    }

    /// Matches documents whose field equals one of `values`.
    #[inline]
    pub fn is_in<T: Into<Value>>(self, values: Vec<T>) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::In, values)
    }

    /// Matches documents whose array field shares at least one element with `values`.
    #[inline]
    pub fn array_contains_any<T: Into<Value>>(self, values: Vec<T>) -> FieldFilter {
        FieldFilter::new(&self.field_name, Operator::ArrayContainsAny, values)
    }
}

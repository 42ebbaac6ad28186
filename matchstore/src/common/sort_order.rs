use crate::errors::{ErrorKind, StoreError};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Specifies the direction for ordering query results.
///
/// # Variants
/// - `Ascending`: smallest to largest (A to Z, oldest to newest)
/// - `Descending`: largest to smallest (Z to A, newest to oldest)
///
/// Parses from the wire spellings `"asc"` and `"desc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(StoreError::new(
                &format!("Unknown sort direction '{}'", other),
                ErrorKind::FilterError,
            )),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

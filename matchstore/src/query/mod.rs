//! Query builder for collection scans.
//!
//! A [Query] is an immutable value made of field filters combined with
//! logical AND and at most one sort key. Building a query never touches
//! storage; [Query::evaluate] runs it against a document map supplied by the
//! caller, which is how the local store executes queries and how the remote
//! store's results can be checked in tests.
//!
//! # Examples
//!
//! ```rust
//! use matchstore::doc;
//! use matchstore::common::{Document, SortOrder};
//! use matchstore::query::{field, Operator, Query};
//!
//! let docs: Vec<(String, Document)> = vec![
//!     ("a".into(), doc! { score: 1 }),
//!     ("b".into(), doc! { score: 5 }),
//!     ("c".into(), doc! { score: 3 }),
//! ];
//!
//! let query = Query::new()
//!     .filter("score", Operator::GreaterThan, 1)
//!     .order_by("score", SortOrder::Descending);
//! let ids: Vec<String> = query
//!     .evaluate(docs.iter().map(|(id, d)| (id, d)))
//!     .into_iter()
//!     .map(|(id, _)| id)
//!     .collect();
//! assert_eq!(ids, vec!["b", "c"]);
//!
//! // fluent form of the same filter
//! let same = Query::new().with(field("score").gt(1));
//! assert_eq!(same.filters().len(), 1);
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `==`, `!=`
//! - **Comparison**: `>`, `>=`, `<`, `<=`
//! - **Array**: `array-contains`, `in`, `array-contains-any`

mod filter;
mod query;

pub use filter::*;
pub use query::*;

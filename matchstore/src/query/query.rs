use crate::common::{Document, SortOrder, Value};
use crate::query::{FieldFilter, Operator};

/// An immutable filter and sort specification.
///
/// Every builder method returns a new `Query`; the receiver is left as it
/// was, so a partially built query can be shared between branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<FieldFilter>,
    ordering: Option<(String, SortOrder)>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    /// Returns a query with one more filter. Filters combine with logical AND.
    pub fn filter(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Query {
        self.with(FieldFilter::new(field, operator, value))
    }

    /// Returns a query with an already built filter appended.
    pub fn with(&self, filter: FieldFilter) -> Query {
        let mut next = self.clone();
        next.filters.push(filter);
        next
    }

    /// Returns a query sorted by `field`. A query has at most one sort key;
    /// a later call replaces the earlier one.
    pub fn order_by(&self, field: &str, order: SortOrder) -> Query {
        let mut next = self.clone();
        next.ordering = Some((field.to_string(), order));
        next
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<(&str, SortOrder)> {
        self.ordering
            .as_ref()
            .map(|(field, order)| (field.as_str(), *order))
    }

    /// Checks a single document against every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }

    /// Runs the query over `documents`.
    ///
    /// Filtering happens first, then a single stable sort if an order was
    /// given. Documents without the sort field sort as `null`, which is the
    /// lowest value. Without an order the input iteration order is kept.
    pub fn evaluate<'a, I>(&self, documents: I) -> Vec<(String, Document)>
    where
        I: IntoIterator<Item = (&'a String, &'a Document)>,
    {
        let mut results: Vec<(String, Document)> = documents
            .into_iter()
            .filter(|(_, document)| self.matches(document))
            .map(|(id, document)| (id.clone(), document.clone()))
            .collect();

        if let Some((field, order)) = &self.ordering {
            results.sort_by(|(_, left), (_, right)| {
                let ordering = sort_key(left, field).total_cmp(sort_key(right, field));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        results
    }
}

static NULL: Value = Value::Null;

fn sort_key<'a>(document: &'a Document, field: &str) -> &'a Value {
    document.resolve(field).unwrap_or(&NULL)
}

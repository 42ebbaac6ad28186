use crate::common::{Document, SortOrder, Value};
use crate::errors::StoreResult;
use crate::query::{FieldFilter, Operator, Query};
use crate::store::{DocumentRef, DocumentStore, QuerySnapshot};

/// Handle to a named collection.
#[derive(Clone)]
pub struct CollectionRef {
    store: DocumentStore,
    name: String,
}

impl CollectionRef {
    pub(crate) fn new(store: DocumentStore, name: &str) -> Self {
        CollectionRef {
            store,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to the document with the given id.
    pub fn doc(&self, id: &str) -> DocumentRef {
        DocumentRef::new(self.store.clone(), &self.name, id)
    }

    /// Stores `data` under a generated id and returns a handle to it.
    pub fn add(&self, data: Document) -> StoreResult<DocumentRef> {
        let id = self.store.add_document(&self.name, data)?;
        Ok(self.doc(&id))
    }

    /// Starts a query with one filter.
    pub fn filter(&self, field: &str, operator: Operator, value: impl Into<Value>) -> QueryRef {
        self.query(Query::new().filter(field, operator, value))
    }

    /// Starts a query with a fluent filter, e.g. `users.with(field("rank").gt(2))`.
    pub fn with(&self, filter: FieldFilter) -> QueryRef {
        self.query(Query::new().with(filter))
    }

    /// Starts a query sorted by `field`.
    pub fn order_by(&self, field: &str, order: SortOrder) -> QueryRef {
        self.query(Query::new().order_by(field, order))
    }

    /// Binds an already built query to this collection.
    pub fn query(&self, query: Query) -> QueryRef {
        QueryRef {
            collection: self.clone(),
            query,
        }
    }

    /// Reads every document of the collection.
    pub fn get(&self) -> StoreResult<QuerySnapshot> {
        self.query(Query::new()).get()
    }
}

/// A query bound to a collection. Nothing runs until [QueryRef::get].
#[derive(Clone)]
pub struct QueryRef {
    collection: CollectionRef,
    query: Query,
}

impl QueryRef {
    pub fn filter(&self, field: &str, operator: Operator, value: impl Into<Value>) -> QueryRef {
        QueryRef {
            collection: self.collection.clone(),
            query: self.query.filter(field, operator, value),
        }
    }

    pub fn with(&self, filter: FieldFilter) -> QueryRef {
        QueryRef {
            collection: self.collection.clone(),
            query: self.query.with(filter),
        }
    }

    pub fn order_by(&self, field: &str, order: SortOrder) -> QueryRef {
        QueryRef {
            collection: self.collection.clone(),
            query: self.query.order_by(field, order),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn get(&self) -> StoreResult<QuerySnapshot> {
        let results = self
            .collection
            .store
            .run_query(&self.collection.name, &self.query)?;
        Ok(QuerySnapshot::from_results(results))
    }
}

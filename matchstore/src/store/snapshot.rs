use crate::common::Document;

/// The result of reading a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    id: String,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub fn new(id: &str, data: Option<Document>) -> Self {
        DocumentSnapshot {
            id: id.to_string(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The document fields, or `None` if the document does not exist.
    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Document> {
        self.data
    }
}

/// The result of a query or a full collection scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn from_results(results: Vec<(String, Document)>) -> Self {
        QuerySnapshot {
            docs: results
                .into_iter()
                .map(|(id, data)| DocumentSnapshot {
                    id,
                    data: Some(data),
                })
                .collect(),
        }
    }

    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.docs
    }

    pub fn empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.docs.iter().map(|doc| doc.id()).collect()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}

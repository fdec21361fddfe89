//! Insertion-ordered document storage.

use std::collections::HashMap;

use {
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Display name for documents without `filename` metadata.
pub const UNNAMED_DOCUMENT: &str = "Unnamed document";

/// An ingested document. Immutable once stored; removed only by an
/// explicit delete. Ids are opaque and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Listing entry: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
}

/// Documents in insertion order.
///
/// Storage position doubles as the vector-index row of the same document:
/// `by_row(i)` resolves the document whose vector lives at row `i` without
/// re-deriving any ordering at read time. `remove` shifts later positions
/// down by one, mirroring `FlatIndex::remove`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStore {
    docs: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Store a document under a freshly generated id, returning the id.
    pub fn insert(&mut self, content: String, metadata: HashMap<String, String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.docs.push(Document {
            id: id.clone(),
            content,
            metadata,
        });
        id
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.id == id)
    }

    /// Ordinal position of `id` among current documents.
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.docs.iter().position(|d| d.id == id)
    }

    /// Document stored at `row`, if any.
    pub fn by_row(&self, row: usize) -> Option<&Document> {
        self.docs.get(row)
    }

    /// Remove `id`, returning the row it occupied. Later rows shift down.
    pub fn remove(&mut self, id: &str) -> Option<usize> {
        let row = self.position_of(id)?;
        self.docs.remove(row);
        Some(row)
    }

    /// All documents as `{id, filename}` summaries, insertion order.
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.docs
            .iter()
            .map(|d| DocumentSummary {
                id: d.id.clone(),
                filename: d
                    .metadata
                    .get("filename")
                    .cloned()
                    .unwrap_or_else(|| UNNAMED_DOCUMENT.to_string()),
            })
            .collect()
    }
}

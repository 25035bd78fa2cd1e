//! Documents and the ordered in-memory collection.
//!
//! One `DocumentCollection` backs the unlocked vault, another the plaintext
//! "normal" collection; both persist through their owner, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    fn new(title: &str, content: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Insertion-ordered collection. Deletion removes exactly one element by id;
/// titles and contents are not unique keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Append a new document. Title and content are trimmed; at least one of
    /// the two must be non-empty.
    pub fn create(&mut self, title: &str, content: &str) -> Result<&Document> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Err(VaultError::Validation(
                "add a title or content".to_string(),
            ));
        }
        self.documents.push(Document::new(title, content));
        Ok(self.documents.last().expect("non-empty after push"))
    }

    /// Replace title and content, refreshing `updated_at`.
    pub fn update(&mut self, id: Uuid, title: &str, content: &str) -> Result<&Document> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Err(VaultError::Validation(
                "add a title or content".to_string(),
            ));
        }
        let doc = self
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| VaultError::NotFound(format!("document {id}")))?;
        doc.title = title.trim().to_string();
        doc.content = content.trim().to_string();
        doc.updated_at = Utc::now();
        Ok(doc)
    }

    /// Remove exactly one document by id. Deleting an id that already
    /// vanished reports `NotFound` and leaves the collection unchanged.
    pub fn delete(&mut self, id: Uuid) -> Result<Document> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| VaultError::NotFound(format!("document {id}")))?;
        Ok(self.documents.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Case-insensitive substring match over titles only, original order.
    /// An empty term returns everything.
    pub fn search(&self, term: &str) -> Vec<&Document> {
        let needle = term.trim().to_lowercase();
        self.documents
            .iter()
            .filter(|d| needle.is_empty() || d.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn list(&self) -> &[Document] {
        &self.documents
    }
}

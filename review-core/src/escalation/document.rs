//! Document-store and principal collaborators
//!
//! The real document database and auth layer live outside this crate. These
//! traits are the seams; the in-memory implementations back tests and local
//! tooling.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for document-store operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum DocumentError {
    #[error("Document store error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for document-store operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Whole-document store keyed by (collection, id).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Snapshot of one document, or `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> DocumentResult<Option<serde_json::Value>>;

    /// Upsert the whole document.
    async fn put(
        &self,
        collection: &str,
        id: &str,
        document: serde_json::Value,
    ) -> DocumentResult<()>;

    /// All documents whose top-level `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> DocumentResult<Vec<serde_json::Value>>;
}

/// In-process document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, serde_json::Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> DocumentResult<Option<serde_json::Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DocumentError::Backend("lock poisoned".into()))?;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        document: serde_json::Value,
    ) -> DocumentResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| DocumentError::Backend("lock poisoned".into()))?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> DocumentResult<Vec<serde_json::Value>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| DocumentError::Backend("lock poisoned".into()))?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// The signed-in reviewer that owns new records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
}

/// Yields the current principal, if any.
pub trait PrincipalSource: Send + Sync {
    fn current(&self) -> Option<Principal>;
}

/// Fixed principal, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticPrincipal(Option<Principal>);

impl StaticPrincipal {
    pub fn signed_in(uid: impl Into<String>) -> Self {
        Self(Some(Principal { uid: uid.into() }))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl PrincipalSource for StaticPrincipal {
    fn current(&self) -> Option<Principal> {
        self.0.clone()
    }
}

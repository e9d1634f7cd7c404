//! In-memory store for testing
//!
//! Stores entries in memory and counts operations, so tests can assert that
//! memoized collections never issue a second query.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use verdant_core::Attributes;

use crate::error::{Result, StoreError};
use crate::store::KvStore;

/// Counts of store operations performed, for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub dumps: usize,
    pub reads: usize,
}

/// In-memory `KvStore` implementation
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<IndexMap<String, Attributes>>>,
    operations: Arc<RwLock<OperationCounts>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an entry at a full path.
    pub fn put<K, V>(&self, path: &str, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let attrs: Attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.entries.write().unwrap().insert(path.to_string(), attrs);
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        *self.operations.write().unwrap() = OperationCounts::default();
    }
}

impl KvStore for MemoryStore {
    fn dump(&self, prefix: &str) -> Result<IndexMap<String, Attributes>> {
        self.operations.write().unwrap().dumps += 1;
        let want = format!("{prefix}/");
        let entries = self.entries.read().unwrap();
        let mut out = IndexMap::new();
        for (path, attrs) in entries.iter() {
            if let Some(rel) = path.strip_prefix(&want) {
                out.insert(rel.to_string(), attrs.clone());
            }
        }
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<Attributes> {
        self.operations.write().unwrap().reads += 1;
        self.entries
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NoData {
                path: path.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_strips_the_prefix() {
        let store = MemoryStore::new();
        store.put("secret/verdant/clouds/minikube", [("provisioner", "minikube")]);
        store.put("secret/verdant/clusters/minikube", [("cloud_id", "minikube")]);

        let dumped = store.dump("secret/verdant/clouds").unwrap();
        assert_eq!(dumped.len(), 1);
        assert_eq!(dumped["minikube"]["provisioner"], "minikube");
    }

    #[test]
    fn read_misses_report_the_path() {
        let store = MemoryStore::new();
        let err = store.read("secret/verdant/clouds/ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn operations_are_counted() {
        let store = MemoryStore::new();
        store.put("p/a", [("k", "v")]);
        let _ = store.dump("p");
        let _ = store.read("p/a");
        let counts = store.operation_counts();
        assert_eq!(counts.dumps, 1);
        assert_eq!(counts.reads, 1);
    }
}

//! Cache backend implementations.

use super::key::CacheKey;
use crate::types::ResponseSnapshot;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("namespace is being retired: {0}")]
    Retired(String),

    #[error("namespace belongs to a superseded version: {0}")]
    Superseded(String),

    #[error("refusing to store non-GET request: {0}")]
    NotCacheable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Namespace-aware snapshot storage.
///
/// `put` replaces any prior snapshot at the same key and implicitly creates the
/// namespace. `delete_namespace` must remove the whole partition before it
/// resolves.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, namespace: &str, key: &CacheKey) -> StoreResult<Option<ResponseSnapshot>>;
    async fn put(&self, namespace: &str, key: &CacheKey, snapshot: ResponseSnapshot) -> StoreResult<()>;
    /// Create the namespace if missing. Returns `true` when it was created.
    async fn open(&self, namespace: &str) -> StoreResult<bool>;
    async fn delete_namespace(&self, namespace: &str) -> StoreResult<bool>;
    async fn namespaces(&self) -> StoreResult<Vec<String>>;
    async fn len(&self, namespace: &str) -> StoreResult<usize>;
    fn name(&self) -> &'static str;
}

type Partition = HashMap<String, (CacheKey, ResponseSnapshot)>;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

/// In-process backend. Namespaces are listed in name order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<BTreeMap<String, Partition>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryStore {
    async fn get(&self, namespace: &str, key: &CacheKey) -> StoreResult<Option<ResponseSnapshot>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions
            .get(namespace)
            .and_then(|p| p.get(&key.hash))
            .map(|(_, snap)| snap.clone()))
    }

    async fn put(&self, namespace: &str, key: &CacheKey, snapshot: ResponseSnapshot) -> StoreResult<()> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        partitions
            .entry(namespace.to_string())
            .or_default()
            .insert(key.hash.clone(), (key.clone(), snapshot));
        Ok(())
    }

    async fn open(&self, namespace: &str) -> StoreResult<bool> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        if partitions.contains_key(namespace) {
            return Ok(false);
        }
        partitions.insert(namespace.to_string(), Partition::new());
        Ok(true)
    }

    async fn delete_namespace(&self, namespace: &str) -> StoreResult<bool> {
        Ok(self
            .partitions
            .write()
            .map_err(poisoned)?
            .remove(namespace)
            .is_some())
    }

    async fn namespaces(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .partitions
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect())
    }

    async fn len(&self, namespace: &str) -> StoreResult<usize> {
        Ok(self
            .partitions
            .read()
            .map_err(poisoned)?
            .get(namespace)
            .map(|p| p.len())
            .unwrap_or(0))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

pub struct NullStore;
impl NullStore {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullStore {
    async fn get(&self, _: &str, _: &CacheKey) -> StoreResult<Option<ResponseSnapshot>> {
        Ok(None)
    }
    async fn put(&self, _: &str, _: &CacheKey, _: ResponseSnapshot) -> StoreResult<()> {
        Ok(())
    }
    async fn open(&self, _: &str) -> StoreResult<bool> {
        Ok(false)
    }
    async fn delete_namespace(&self, _: &str) -> StoreResult<bool> {
        Ok(false)
    }
    async fn namespaces(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn len(&self, _: &str) -> StoreResult<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

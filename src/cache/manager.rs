//! Per-instance cache store handle.

use super::backend::{CacheBackend, StoreError, StoreResult};
use super::key::CacheKey;
use super::namespace::{NamespaceName, Namespaces};
use crate::types::{RequestDescriptor, ResponseSnapshot};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Namespace bookkeeping shared by every handle onto one backend.
#[derive(Default)]
struct Ledger {
    /// Tombstoned namespaces.
    retired: HashSet<String>,
    /// Namespaces explicitly created or revived through [`CacheStore::open`].
    opened: HashSet<String>,
    /// Version whose activation fences off older namespaces.
    fence: Option<Namespaces>,
}

impl Ledger {
    fn is_superseded(&self, namespace: &str) -> bool {
        match &self.fence {
            Some(fence) => fence.is_stale(namespace) && !self.opened.contains(namespace),
            None => false,
        }
    }
}

/// Handle onto a shared [`CacheBackend`].
///
/// Handles created with [`CacheStore::handle`] share the backend and the
/// namespace ledger, but each carries its own stats and its own seal. A sealed
/// handle (redundant proxy instance) still reads but silently drops writes.
///
/// Retirement is a tombstone: from the moment deletion of a namespace begins,
/// every handle treats it as empty and refuses to write into it, until the
/// namespace is explicitly reopened.
///
/// Once a version starts activating ([`CacheStore::fence`]), writes into any
/// namespace that is stale for it are refused unless the namespace was
/// explicitly opened afterwards, so no handle can recreate an old version's
/// namespace behind the activation's back.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    ledger: Arc<Mutex<Ledger>>,
    sealed: AtomicBool,
    stats: AtomicStats,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            ledger: Arc::new(Mutex::new(Ledger::default())),
            sealed: AtomicBool::new(false),
            stats: AtomicStats::new(),
        }
    }

    /// A fresh handle onto the same backend (unsealed, zeroed stats).
    pub fn handle(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            ledger: Arc::clone(&self.ledger),
            sealed: AtomicBool::new(false),
            stats: AtomicStats::new(),
        }
    }

    fn is_retired(&self, namespace: &str) -> bool {
        // A poisoned ledger fails closed.
        self.ledger
            .lock()
            .map(|l| l.retired.contains(namespace))
            .unwrap_or(true)
    }

    fn is_superseded(&self, namespace: &str) -> bool {
        self.ledger
            .lock()
            .map(|l| l.is_superseded(namespace))
            .unwrap_or(true)
    }

    /// Refuse writes into every namespace stale for `incoming`, across all handles.
    pub fn fence(&self, incoming: &Namespaces) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.fence = Some(incoming.clone());
        }
    }

    /// Lookup that never fails: store errors and retired namespaces read as a miss.
    pub async fn lookup(
        &self,
        namespace: &NamespaceName,
        request: &RequestDescriptor,
    ) -> Option<ResponseSnapshot> {
        if !request.is_get() {
            return None;
        }
        if self.is_retired(namespace.as_str()) {
            debug!(namespace = %namespace, url = %request.url, "lookup against retired namespace");
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let key = CacheKey::for_request(request);
        match self.backend.get(namespace.as_str(), &key).await {
            Ok(Some(snapshot)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(snapshot)
            }
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                warn!(namespace = %namespace, url = %request.url, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Best-effort write used on the request path. Returns whether the snapshot
    /// was committed.
    pub async fn store(
        &self,
        namespace: &NamespaceName,
        request: &RequestDescriptor,
        snapshot: &ResponseSnapshot,
    ) -> bool {
        if self.is_sealed() {
            debug!(namespace = %namespace, url = %request.url, "store sealed, skipping cache write");
            return false;
        }
        match self.put_strict(namespace, request, snapshot).await {
            Ok(()) => true,
            Err(e) => {
                warn!(namespace = %namespace, url = %request.url, error = %e, "cache write dropped");
                false
            }
        }
    }

    /// Write that reports failures. Used by installation, which must be all-or-nothing.
    pub async fn put_strict(
        &self,
        namespace: &NamespaceName,
        request: &RequestDescriptor,
        snapshot: &ResponseSnapshot,
    ) -> StoreResult<()> {
        let key = CacheKey::for_request(request);
        if !key.is_get() {
            return Err(StoreError::NotCacheable(key.to_string()));
        }
        if self.is_retired(namespace.as_str()) {
            return Err(StoreError::Retired(namespace.to_string()));
        }
        if self.is_superseded(namespace.as_str()) {
            return Err(StoreError::Superseded(namespace.to_string()));
        }
        match self
            .backend
            .put(namespace.as_str(), &key, snapshot.clone())
            .await
        {
            Ok(()) => {
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Create (or revive) a namespace. Returns `true` when it did not exist before.
    pub async fn open(&self, namespace: &NamespaceName) -> StoreResult<bool> {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.retired.remove(namespace.as_str());
            ledger.opened.insert(namespace.to_string());
        }
        self.backend.open(namespace.as_str()).await
    }

    pub async fn namespaces(&self) -> StoreResult<Vec<String>> {
        self.backend.namespaces().await
    }

    pub async fn len(&self, namespace: &NamespaceName) -> StoreResult<usize> {
        if self.is_retired(namespace.as_str()) {
            return Ok(0);
        }
        self.backend.len(namespace.as_str()).await
    }

    /// Tombstone `namespace` and delete it. Resolves only after the backend has
    /// finished the deletion.
    pub async fn retire(&self, namespace: &str) -> StoreResult<bool> {
        {
            let mut ledger = self
                .ledger
                .lock()
                .map_err(|_| StoreError::Unavailable("retirement ledger poisoned".into()))?;
            ledger.opened.remove(namespace);
            ledger.retired.insert(namespace.to_string());
        }
        match self.backend.delete_namespace(namespace).await {
            Ok(deleted) => {
                if deleted {
                    self.stats.deletes.fetch_add(1, Ordering::Relaxed);
                }
                Ok(deleted)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Stop accepting writes through this handle. Irreversible.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

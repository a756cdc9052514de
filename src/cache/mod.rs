//! 缓存存储模块：按命名空间与版本划分的请求→响应快照存储。
//!
//! # Cache Store Module
//!
//! Key-value store of `(request descriptor → response snapshot)` pairs,
//! partitioned into named, versioned namespaces.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheStore`] | Per-instance handle: GET-only guard, retirement tombstones, stats |
//! | [`CacheBackend`] | Trait for pluggable namespace-aware storage |
//! | [`MemoryStore`] | In-process backend |
//! | [`NullStore`] | Backend that stores nothing (every lookup misses) |
//! | [`CacheKey`] | Lookup identity derived from `(method, url)` |
//! | [`NamespaceName`] | `{prefix}-{kind}-{version}` naming and recognition |
//!
//! ## Failure Model
//!
//! Backend failures never escalate past [`CacheStore`] on the request path:
//! lookups degrade to a miss and writes are dropped, both logged. Only the
//! install path uses the strict write API, because installation is
//! all-or-nothing.

mod backend;
mod key;
mod manager;
mod namespace;

pub use backend::{CacheBackend, MemoryStore, NullStore, StoreError, StoreResult};
pub use key::CacheKey;
pub use manager::{CacheStats, CacheStore};
pub use namespace::{NamespaceKind, NamespaceName, Namespaces};

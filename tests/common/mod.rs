//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use offline_proxy::cache::{CacheBackend, CacheKey, MemoryStore, StoreResult};
use offline_proxy::transport::ScriptedNetwork;
use offline_proxy::{ProxyConfig, Registration, RequestDescriptor, ResponseSnapshot};
use std::sync::Arc;

pub const ORIGIN: &str = "http://app.test";
pub const SHELL_HTML: &str = "<!doctype html><title>shell</title>";

/// Test fixture that wires a registration to a scripted network and an
/// in-memory backend the test can inspect directly.
pub struct Site {
    pub backend: Arc<dyn CacheBackend>,
    pub network: Arc<ScriptedNetwork>,
    pub registration: Arc<Registration>,
}

impl Site {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(MemoryStore::new()))
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        let network = Arc::new(ScriptedNetwork::new());
        network
            .route("/", ResponseSnapshot::new(200).with_body(SHELL_HTML))
            .route("/app.js", ResponseSnapshot::new(200).with_body("console.log('v1')"))
            .route(
                "/api/data",
                ResponseSnapshot::new(200)
                    .with_header("Content-Type", "application/json")
                    .with_body(r#"{"x":1}"#),
            );
        let registration = Arc::new(Registration::new(backend.clone(), network.clone()));
        Self {
            backend,
            network,
            registration,
        }
    }

    /// Install `version` and promote it.
    pub async fn deploy(&self, version: &str) {
        self.registration.install(config(version)).await.unwrap();
        self.registration.promote().await.unwrap();
    }

    pub async fn namespaces(&self) -> Vec<String> {
        self.backend.namespaces().await.unwrap()
    }
}

pub fn config(version: &str) -> ProxyConfig {
    ProxyConfig::default()
        .with_prefix("app")
        .with_version(version)
        .with_origin(ORIGIN)
        .with_manifest(["/", "/app.js"])
}

pub fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::get(&format!("{}{}", ORIGIN, path)).unwrap()
}

pub fn navigate(path: &str) -> RequestDescriptor {
    get(path).with_accept("text/html,application/xhtml+xml")
}

/// [`MemoryStore`] that gives up the executor before listing or deleting
/// namespaces, so other tasks interleave with activation.
#[derive(Default)]
pub struct YieldingStore {
    inner: MemoryStore,
}

impl YieldingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for YieldingStore {
    async fn get(&self, namespace: &str, key: &CacheKey) -> StoreResult<Option<ResponseSnapshot>> {
        self.inner.get(namespace, key).await
    }

    async fn put(&self, namespace: &str, key: &CacheKey, snapshot: ResponseSnapshot) -> StoreResult<()> {
        self.inner.put(namespace, key, snapshot).await
    }

    async fn open(&self, namespace: &str) -> StoreResult<bool> {
        self.inner.open(namespace).await
    }

    async fn delete_namespace(&self, namespace: &str) -> StoreResult<bool> {
        tokio::task::yield_now().await;
        self.inner.delete_namespace(namespace).await
    }

    async fn namespaces(&self) -> StoreResult<Vec<String>> {
        tokio::task::yield_now().await;
        self.inner.namespaces().await
    }

    async fn len(&self, namespace: &str) -> StoreResult<usize> {
        self.inner.len(namespace).await
    }

    fn name(&self) -> &'static str {
        "yielding"
    }
}

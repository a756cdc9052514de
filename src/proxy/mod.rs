//! 代理实例模块：显式持有缓存句柄、版本标签与各组件的代理实例。
//!
//! # Proxy Instance
//!
//! One [`ProxyInstance`] per deployed version. It owns its cache store handle,
//! its version tag and every per-request component, and is passed explicitly
//! wherever it is needed. A [`Registration`] tracks which instance is waiting
//! and which is active for a client scope.

mod registration;

pub use registration::Registration;

use crate::cache::{CacheStats, CacheStore, Namespaces};
use crate::classifier::RequestClassifier;
use crate::config::ProxyConfig;
use crate::fallback::FallbackResolver;
use crate::lifecycle::{ActivationReport, InstallReport, LifecycleManager, LifecycleState};
use crate::strategy::{Served, StrategyEngine};
use crate::transport::Network;
use crate::types::{Method, RequestDescriptor, TrafficClass};
use crate::Result;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct ProxyInstance {
    id: Uuid,
    config: ProxyConfig,
    namespaces: Namespaces,
    store: Arc<CacheStore>,
    classifier: RequestClassifier,
    engine: StrategyEngine,
    lifecycle: LifecycleManager,
}

impl std::fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("namespaces", &self.namespaces)
            .finish_non_exhaustive()
    }
}

impl ProxyInstance {
    /// Build an instance in the Installing state. `store` is the scope's shared
    /// store; the instance takes its own handle onto it.
    pub fn new(config: ProxyConfig, store: &CacheStore, network: Arc<dyn Network>) -> Result<Self> {
        config.validate()?;
        let namespaces = Namespaces::for_version(&config.cache_prefix, &config.version);
        let store = Arc::new(store.handle());

        let manifest = config
            .manifest
            .iter()
            .map(|path| -> Result<RequestDescriptor> {
                Ok(RequestDescriptor::new(Method::Get, config.resolve(path)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let fallback = FallbackResolver::new(
            store.clone(),
            namespaces.static_ns.clone(),
            config.resolve(&config.offline_shell)?,
        );
        let engine = StrategyEngine::new(
            store.clone(),
            network.clone(),
            fallback,
            namespaces.clone(),
        );
        let lifecycle = LifecycleManager::new(store.clone(), network, namespaces.clone(), manifest);

        Ok(Self {
            id: Uuid::new_v4(),
            classifier: RequestClassifier::new(config.manifest.iter().cloned()),
            config,
            namespaces,
            store,
            engine,
            lifecycle,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// `{prefix}-{version}`, as reported to the host application.
    pub fn version_label(&self) -> String {
        self.namespaces.version_label()
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn classify(&self, request: &RequestDescriptor) -> TrafficClass {
        self.classifier.classify(request)
    }

    pub async fn install(&self) -> Result<InstallReport> {
        self.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<ActivationReport> {
        self.lifecycle.activate().await
    }

    pub(crate) fn make_redundant(&self) {
        debug!(instance = %self.id, version = self.version(), "instance is now redundant");
        self.lifecycle.make_redundant();
    }

    /// Classify and run the matching strategy.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Result<Served> {
        let class = self.classify(request);
        debug!(
            instance = %self.id,
            method = %request.method,
            url = %request.url,
            class = %class,
            "intercepted request"
        );
        self.engine.execute(request, class).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }
}

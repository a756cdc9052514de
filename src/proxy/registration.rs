//! Client-scope registration: which instance waits and which serves.

use super::ProxyInstance;
use crate::cache::{CacheBackend, CacheStore};
use crate::config::ProxyConfig;
use crate::lifecycle::{ActivationReport, InstallReport};
use crate::strategy::{ResponseSource, Served};
use crate::transport::Network;
use crate::types::RequestDescriptor;
use crate::Result;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Exactly one instance serves traffic for a scope at a time. A freshly
/// installed instance waits until promoted; promotion retires the previous
/// active instance. Installs and promotions are serialized against each
/// other; fetches never wait on them.
pub struct Registration {
    store: CacheStore,
    network: Arc<dyn Network>,
    active: ArcSwapOption<ProxyInstance>,
    waiting: ArcSwapOption<ProxyInstance>,
    transitions: Mutex<()>,
}

impl Registration {
    pub fn new(backend: Arc<dyn CacheBackend>, network: Arc<dyn Network>) -> Self {
        Self {
            store: CacheStore::new(backend),
            network,
            active: ArcSwapOption::empty(),
            waiting: ArcSwapOption::empty(),
            transitions: Mutex::new(()),
        }
    }

    pub fn active(&self) -> Option<Arc<ProxyInstance>> {
        self.active.load_full()
    }

    pub fn waiting(&self) -> Option<Arc<ProxyInstance>> {
        self.waiting.load_full()
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Install a new version. On failure the current active and waiting
    /// instances are left exactly as they were.
    pub async fn install(&self, config: ProxyConfig) -> Result<(Arc<ProxyInstance>, InstallReport)> {
        let _guard = self.transitions.lock().await;
        let auto_promote = config.auto_promote;
        let instance = Arc::new(ProxyInstance::new(config, &self.store, self.network.clone())?);
        let report = instance.install().await?;

        if let Some(superseded) = self.waiting.swap(Some(instance.clone())) {
            superseded.make_redundant();
        }
        if auto_promote {
            self.promote_locked().await?;
        }
        Ok((instance, report))
    }

    /// Promote the waiting instance, if any. Returns the activation report.
    pub async fn promote(&self) -> Result<Option<ActivationReport>> {
        let _guard = self.transitions.lock().await;
        self.promote_locked().await
    }

    async fn promote_locked(&self) -> Result<Option<ActivationReport>> {
        let Some(next) = self.waiting.load_full() else {
            debug!("promote requested with no waiting instance");
            return Ok(None);
        };
        let report = next.activate().await?;

        self.waiting.store(None);
        if let Some(previous) = self.active.swap(Some(next.clone())) {
            previous.make_redundant();
        }
        info!(version = next.version(), instance = %next.id(), "instance promoted");
        Ok(Some(report))
    }

    /// Route a request to the active instance, or straight to the network when
    /// nothing controls the scope yet.
    pub async fn handle_fetch(&self, request: &RequestDescriptor) -> Result<Served> {
        match self.active.load_full() {
            Some(instance) => instance.handle_fetch(request).await,
            None => {
                debug!(url = %request.url, "no active instance, passing through");
                let response = self.network.fetch(request).await?;
                Ok(Served {
                    response,
                    source: ResponseSource::Bypass,
                    class: crate::types::TrafficClass::Uncategorized,
                })
            }
        }
    }
}

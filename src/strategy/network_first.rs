//! Network-first strategy for API and uncategorized traffic.

use super::{ResponseSource, Served, StrategyEngine};
use crate::types::{RequestDescriptor, TrafficClass};
use tracing::{debug, info};

impl StrategyEngine {
    /// Network first, mirror successes into `dynamic`, fall back to the stale
    /// copy on transport failure.
    ///
    /// `CacheableApi` and `Uncategorized` share the algorithm; the class only
    /// changes how the fallback is rendered.
    pub(crate) async fn network_first(&self, request: &RequestDescriptor, class: TrafficClass) -> Served {
        let ns = &self.namespaces.dynamic_ns;
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() && self.store.store(ns, request, &response).await {
                    debug!(url = %request.url, class = %class, "response cached");
                }
                Served::new(response, ResponseSource::Network, class)
            }
            Err(e) => {
                info!(url = %request.url, error = %e, "network failed, trying cache");
                if let Some(stale) = self.store.lookup(ns, request).await {
                    debug!(url = %request.url, "serving stale response from cache");
                    return Served::new(stale, ResponseSource::Cache, class);
                }
                let response = self.fallback.resolve(request, class).await;
                Served::new(response, ResponseSource::Fallback, class)
            }
        }
    }
}

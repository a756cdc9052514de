//! Cache-first strategy for static assets.
//!
//! Presence in the version-tagged `static` namespace implies freshness, so a
//! hit is returned without any network call.

use super::{ResponseSource, Served, StrategyEngine};
use crate::types::{RequestDescriptor, TrafficClass};
use tracing::{debug, warn};

impl StrategyEngine {
    pub(crate) async fn cache_first(&self, request: &RequestDescriptor) -> Served {
        let ns = &self.namespaces.static_ns;
        if let Some(hit) = self.store.lookup(ns, request).await {
            debug!(url = %request.url, namespace = %ns, "serving static asset from cache");
            return Served::new(hit, ResponseSource::Cache, TrafficClass::StaticAsset);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store.store(ns, request, &response).await;
                }
                Served::new(response, ResponseSource::Network, TrafficClass::StaticAsset)
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "static asset unavailable");
                let response = self.fallback.resolve(request, TrafficClass::StaticAsset).await;
                Served::new(response, ResponseSource::Fallback, TrafficClass::StaticAsset)
            }
        }
    }
}

//! 缓存策略模块：按流量分类选择缓存优先或网络优先策略。
//!
//! # Strategy Engine
//!
//! | Traffic class | Strategy | Namespace |
//! |---------------|----------|-----------|
//! | `StaticAsset` | cache-first | `static` |
//! | `CacheableApi` | network-first | `dynamic` |
//! | `Uncategorized` | relaxed network-first | `dynamic` |
//!
//! Every strategy follows the same ordering: a cache write for a request is
//! committed after its network response is observed successful and before the
//! response is returned. Non-success statuses pass through untouched and are
//! never cached; only transport failures fall back to the cache and then to
//! the [`FallbackResolver`].

mod cache_first;
mod network_first;

use crate::cache::{CacheStore, Namespaces};
use crate::fallback::FallbackResolver;
use crate::transport::Network;
use crate::types::{RequestDescriptor, ResponseSnapshot, TrafficClass};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
    /// Non-GET request forwarded without touching the cache.
    Bypass,
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: ResponseSnapshot,
    pub source: ResponseSource,
    pub class: TrafficClass,
}

impl Served {
    fn new(response: ResponseSnapshot, source: ResponseSource, class: TrafficClass) -> Self {
        Self {
            response,
            source,
            class,
        }
    }
}

pub struct StrategyEngine {
    store: Arc<CacheStore>,
    network: Arc<dyn Network>,
    fallback: FallbackResolver,
    namespaces: Namespaces,
}

impl StrategyEngine {
    pub fn new(
        store: Arc<CacheStore>,
        network: Arc<dyn Network>,
        fallback: FallbackResolver,
        namespaces: Namespaces,
    ) -> Self {
        Self {
            store,
            network,
            fallback,
            namespaces,
        }
    }

    /// Run the strategy for `class`.
    ///
    /// Always yields a response for GET requests. Non-GET requests bypass the
    /// cache entirely, so their transport failures are returned as errors.
    pub async fn execute(&self, request: &RequestDescriptor, class: TrafficClass) -> Result<Served> {
        if !request.is_get() {
            return self.bypass(request, class).await;
        }
        let served = match class {
            TrafficClass::StaticAsset => self.cache_first(request).await,
            TrafficClass::CacheableApi | TrafficClass::Uncategorized => {
                self.network_first(request, class).await
            }
        };
        Ok(served)
    }

    async fn bypass(&self, request: &RequestDescriptor, class: TrafficClass) -> Result<Served> {
        debug!(method = %request.method, url = %request.url, "bypassing cache for non-GET request");
        let response = self.network.fetch(request).await?;
        Ok(Served::new(response, ResponseSource::Bypass, class))
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }
}

#[cfg(test)]
mod tests;

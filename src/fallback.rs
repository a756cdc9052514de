//! Offline fallback synthesis.
//!
//! Used when neither the network nor the cache could answer. Never touches the
//! network and never writes to the store.

use crate::cache::{CacheStore, NamespaceName};
use crate::types::{RequestDescriptor, ResponseSnapshot, TrafficClass};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Wire body of the synthetic offline response. Clients match on it byte for byte.
pub const OFFLINE_BODY: &str =
    r#"{"success":false,"error":"Offline - no cached data available","offline":true}"#;

pub const OFFLINE_STATUS: u16 = 503;

/// The structured-data offline response.
pub fn offline_response() -> ResponseSnapshot {
    ResponseSnapshot::new(OFFLINE_STATUS)
        .with_status_text("Service Unavailable")
        .with_header("Content-Type", "application/json")
        .with_body(OFFLINE_BODY)
}

pub struct FallbackResolver {
    store: Arc<CacheStore>,
    static_ns: NamespaceName,
    shell: RequestDescriptor,
}

impl FallbackResolver {
    pub fn new(store: Arc<CacheStore>, static_ns: NamespaceName, shell_url: Url) -> Self {
        Self {
            store,
            static_ns,
            shell: RequestDescriptor::new(crate::types::Method::Get, shell_url),
        }
    }

    /// Synthesize a response for a request that could not be served.
    ///
    /// - Page renders get the cached offline shell, or an empty 404.
    /// - Static assets get an empty 404.
    /// - API and uncategorized traffic get the JSON offline payload with 503.
    pub async fn resolve(&self, request: &RequestDescriptor, class: TrafficClass) -> ResponseSnapshot {
        if request.wants_document() {
            return match self.store.lookup(&self.static_ns, &self.shell).await {
                Some(shell) => {
                    debug!(url = %request.url, "serving offline shell");
                    shell
                }
                None => ResponseSnapshot::new(404),
            };
        }
        match class {
            TrafficClass::StaticAsset => ResponseSnapshot::new(404),
            TrafficClass::CacheableApi | TrafficClass::Uncategorized => offline_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, NamespaceKind};

    fn setup() -> (Arc<CacheStore>, FallbackResolver, NamespaceName) {
        let store = Arc::new(CacheStore::new(Arc::new(MemoryStore::new())));
        let ns = NamespaceName::new("app", NamespaceKind::Static, "v1");
        let resolver = FallbackResolver::new(
            store.clone(),
            ns.clone(),
            Url::parse("http://localhost/").unwrap(),
        );
        (store, resolver, ns)
    }

    #[tokio::test]
    async fn test_api_gets_exact_offline_payload() {
        let (_, resolver, _) = setup();
        let req = RequestDescriptor::get("http://localhost/api/data").unwrap();
        let resp = resolver.resolve(&req, TrafficClass::CacheableApi).await;

        assert_eq!(resp.status, 503);
        assert_eq!(
            resp.text(),
            r#"{"success":false,"error":"Offline - no cached data available","offline":true}"#
        );
        assert_eq!(resp.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["offline"], true);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_document_gets_shell_or_404() {
        let (store, resolver, ns) = setup();
        let page = RequestDescriptor::get("http://localhost/settings")
            .unwrap()
            .with_accept("text/html");

        assert_eq!(resolver.resolve(&page, TrafficClass::Uncategorized).await.status, 404);

        let shell = RequestDescriptor::get("http://localhost/").unwrap();
        store
            .store(&ns, &shell, &ResponseSnapshot::new(200).with_body("<html>shell</html>"))
            .await;
        let resp = resolver.resolve(&page, TrafficClass::Uncategorized).await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_static_asset_gets_empty_404() {
        let (_, resolver, _) = setup();
        let req = RequestDescriptor::get("http://localhost/logo.png").unwrap();
        let resp = resolver.resolve(&req, TrafficClass::StaticAsset).await;
        assert_eq!(resp.status, 404);
        assert!(resp.body.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_is_pure() {
        let (store, resolver, _) = setup();
        let req = RequestDescriptor::get("http://localhost/api/health").unwrap();
        let a = resolver.resolve(&req, TrafficClass::CacheableApi).await;
        let b = resolver.resolve(&req, TrafficClass::CacheableApi).await;

        assert_eq!((a.status, a.body.clone(), a.headers.clone()), (b.status, b.body, b.headers));
        assert_eq!(store.stats().writes, 0);
        assert!(store.namespaces().await.unwrap().is_empty());
    }
}

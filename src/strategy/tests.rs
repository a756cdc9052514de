use super::*;
use crate::cache::MemoryStore;
use crate::fallback::OFFLINE_BODY;
use crate::transport::ScriptedNetwork;
use url::Url;

struct Harness {
    store: Arc<CacheStore>,
    network: Arc<ScriptedNetwork>,
    engine: StrategyEngine,
}

fn harness() -> Harness {
    let store = Arc::new(CacheStore::new(Arc::new(MemoryStore::new())));
    let network = Arc::new(ScriptedNetwork::new());
    let namespaces = Namespaces::for_version("app", "v1");
    let fallback = FallbackResolver::new(
        store.clone(),
        namespaces.static_ns.clone(),
        Url::parse("http://localhost/").unwrap(),
    );
    let engine = StrategyEngine::new(store.clone(), network.clone(), fallback, namespaces);
    Harness {
        store,
        network,
        engine,
    }
}

fn get(path: &str) -> RequestDescriptor {
    RequestDescriptor::get(&format!("http://localhost{}", path)).unwrap()
}

#[tokio::test]
async fn test_cache_first_populates_then_serves_without_network() {
    let h = harness();
    h.network
        .route("/app.js", ResponseSnapshot::new(200).with_body("console.log(1)"));
    let req = get("/app.js");

    let first = h.engine.execute(&req, TrafficClass::StaticAsset).await.unwrap();
    assert_eq!(first.source, ResponseSource::Network);
    assert_eq!(h.network.call_count(), 1);

    for _ in 0..3 {
        let again = h.engine.execute(&req, TrafficClass::StaticAsset).await.unwrap();
        assert_eq!(again.source, ResponseSource::Cache);
        assert_eq!(again.response.text(), "console.log(1)");
    }
    assert_eq!(h.network.call_count(), 1);
}

#[tokio::test]
async fn test_cache_first_does_not_cache_http_errors() {
    let h = harness();
    h.network.route("/broken.css", ResponseSnapshot::new(500));
    let req = get("/broken.css");

    let served = h.engine.execute(&req, TrafficClass::StaticAsset).await.unwrap();
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.status, 500);
    assert!(h
        .store
        .lookup(&h.engine.namespaces().static_ns, &req)
        .await
        .is_none());
}

#[tokio::test]
async fn test_cache_first_offline_miss_is_empty_404() {
    let h = harness();
    h.network.set_online(false);
    let served = h
        .engine
        .execute(&get("/logo.png"), TrafficClass::StaticAsset)
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.response.status, 404);
}

#[tokio::test]
async fn test_network_first_serves_stale_copy_when_offline() {
    let h = harness();
    h.network
        .route("/api/data", ResponseSnapshot::new(200).with_body(r#"{"x":1}"#));
    let req = get("/api/data");

    let live = h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();
    assert_eq!(live.source, ResponseSource::Network);

    h.network.set_online(false);
    let offline = h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();
    assert_eq!(offline.source, ResponseSource::Cache);
    assert_eq!(offline.response, live.response);
}

#[tokio::test]
async fn test_network_first_overwrites_previous_entry() {
    let h = harness();
    let req = get("/api/data");
    h.network
        .route("/api/data", ResponseSnapshot::new(200).with_body("one"));
    h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();
    h.network
        .route("/api/data", ResponseSnapshot::new(200).with_body("two"));
    h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();

    let dynamic = &h.engine.namespaces().dynamic_ns;
    assert_eq!(h.store.len(dynamic).await.unwrap(), 1);
    assert_eq!(h.store.lookup(dynamic, &req).await.unwrap().text(), "two");
}

#[tokio::test]
async fn test_network_first_http_error_is_passed_through() {
    let h = harness();
    let req = get("/api/data");
    h.network
        .route("/api/data", ResponseSnapshot::new(200).with_body("good"));
    h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();

    h.network
        .route("/api/data", ResponseSnapshot::new(502).with_body("bad gateway"));
    let served = h.engine.execute(&req, TrafficClass::CacheableApi).await.unwrap();
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.status, 502);

    // The earlier good copy is untouched.
    let cached = h
        .store
        .lookup(&h.engine.namespaces().dynamic_ns, &req)
        .await
        .unwrap();
    assert_eq!(cached.text(), "good");
}

#[tokio::test]
async fn test_network_first_never_succeeded_yields_offline_payload() {
    let h = harness();
    h.network.set_online(false);
    let served = h
        .engine
        .execute(&get("/api/data"), TrafficClass::CacheableApi)
        .await
        .unwrap();
    assert_eq!(served.source, ResponseSource::Fallback);
    assert_eq!(served.response.status, 503);
    assert_eq!(served.response.text(), OFFLINE_BODY);
}

#[tokio::test]
async fn test_uncategorized_is_mirrored_into_dynamic() {
    let h = harness();
    h.network
        .route("/profile", ResponseSnapshot::new(200).with_body("me"));
    let req = get("/profile");
    h.engine.execute(&req, TrafficClass::Uncategorized).await.unwrap();

    h.network.set_online(false);
    let served = h.engine.execute(&req, TrafficClass::Uncategorized).await.unwrap();
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.text(), "me");
    assert!(h
        .store
        .lookup(&h.engine.namespaces().static_ns, &req)
        .await
        .is_none());
}

#[tokio::test]
async fn test_post_bypasses_cache() {
    let h = harness();
    h.network
        .route("/api/data", ResponseSnapshot::new(201).with_body("created"));
    let post = RequestDescriptor::post("http://localhost/api/data", "{}").unwrap();

    let served = h.engine.execute(&post, TrafficClass::CacheableApi).await.unwrap();
    assert_eq!(served.source, ResponseSource::Bypass);
    assert!(h.store.namespaces().await.unwrap().is_empty());

    h.network.set_online(false);
    let err = h.engine.execute(&post, TrafficClass::CacheableApi).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(h.store.stats().hits + h.store.stats().misses, 0);
}

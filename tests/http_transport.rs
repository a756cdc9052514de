//! HttpTransport against a mock HTTP server

use mockito::{Matcher, Server};
use offline_proxy::transport::{HttpTransport, Network, TransportError};
use offline_proxy::{Method, RequestDescriptor};
use std::time::Duration;

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_success_response_is_captured() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"x":1}"#)
        .create_async()
        .await;

    let request = RequestDescriptor::get(&format!("{}/api/data", server.url())).unwrap();
    let snapshot = transport().fetch(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(snapshot.status, 200);
    assert_eq!(snapshot.status_text, "OK");
    assert_eq!(snapshot.header("Content-Type"), Some("application/json"));
    assert_eq!(snapshot.text(), r#"{"x":1}"#);
}

#[tokio::test]
async fn test_error_status_is_not_a_transport_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/data")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let request = RequestDescriptor::get(&format!("{}/api/data", server.url())).unwrap();
    let snapshot = transport().fetch(&request).await.unwrap();
    assert_eq!(snapshot.status, 502);
    assert_eq!(snapshot.status_text, "Bad Gateway");
    assert!(!snapshot.is_success());
}

#[tokio::test]
async fn test_accept_header_and_body_are_forwarded() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/items")
        .match_header("accept", "application/json")
        .match_body(Matcher::Exact(r#"{"name":"a"}"#.to_string()))
        .with_status(201)
        .create_async()
        .await;

    let request = RequestDescriptor::post(&format!("{}/api/items", server.url()), r#"{"name":"a"}"#)
        .unwrap()
        .with_accept("application/json");
    let snapshot = transport().fetch(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(snapshot.status, 201);
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_error() {
    let request = RequestDescriptor::get("http://127.0.0.1:1/app.js").unwrap();
    tokio_test::assert_err!(transport().fetch(&request).await);
}

#[tokio::test]
async fn test_invalid_method_is_never_sent() {
    let mut server = Server::new_async().await;
    let mock = server.mock("GET", Matcher::Any).expect(0).create_async().await;

    let url = format!("{}/api/items", server.url()).parse().unwrap();
    let request = RequestDescriptor::new(Method::Other("BAD METHOD".into()), url).with_body("{}");
    let err = transport().fetch(&request).await.unwrap_err();

    assert!(matches!(err, TransportError::Other(_)));
    mock.assert_async().await;
}

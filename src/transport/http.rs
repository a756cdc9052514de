use super::{Network, TransportError};
use crate::types::{Method, RequestDescriptor, ResponseSnapshot};
use crate::Result;
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// reqwest-backed [`Network`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(
                env::var("OFFLINE_PROXY_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("OFFLINE_PROXY_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("OFFLINE_PROXY_UPSTREAM_PROXY") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    fn method(method: &Method) -> std::result::Result<reqwest::Method, TransportError> {
        Ok(match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
            Method::Other(m) => reqwest::Method::from_bytes(m.as_bytes())
                .map_err(|_| TransportError::Other(format!("invalid HTTP method: {:?}", m)))?,
        })
    }
}

#[async_trait]
impl Network for HttpTransport {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
    ) -> std::result::Result<ResponseSnapshot, TransportError> {
        let mut req = self
            .client
            .request(Self::method(&request.method)?, request.url.clone());
        if let Some(accept) = &request.accept {
            req = req.header("accept", accept);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        // A body that cannot be read means the response was never fully observed.
        let body = resp.bytes().await?;

        debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            "network response"
        );

        let mut snapshot = ResponseSnapshot::new(status.as_u16())
            .with_body(body)
            .with_captured_at(SystemTime::now());
        snapshot.headers = headers;
        if let Some(reason) = status.canonical_reason() {
            snapshot.status_text = reason.to_string();
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_methods_map_through() {
        let method = HttpTransport::method(&Method::Other("PURGE".into())).unwrap();
        assert_eq!(method.as_str(), "PURGE");
    }

    #[test]
    fn test_invalid_method_token_is_rejected() {
        let err = HttpTransport::method(&Method::Other("BAD METHOD".into())).unwrap_err();
        assert!(matches!(err, TransportError::Other(_)));
    }
}

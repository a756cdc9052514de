//! 网络传输模块：代理与真实网络之间的边界。
//!
//! # Transport Module
//!
//! The [`Network`] trait is the only way the proxy reaches the network. A
//! transport returns `Ok` for every response it managed to observe, whatever
//! the status code; `Err` is reserved for transport-level failures (no route,
//! connection reset, timeout). Strategies rely on this split: only `Err`
//! triggers cache fallback.

mod http;
mod scripted;

pub use http::HttpTransport;
pub use scripted::ScriptedNetwork;

use crate::types::{RequestDescriptor, ResponseSnapshot};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Unreachable(String),

    #[error("Transport error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, TransportError>;
}

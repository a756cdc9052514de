//! # offline-proxy
//!
//! 客户端驻留的拦截式网络缓存：为应用的每个出站请求选择缓存策略，并在离线时合成回退响应。
//!
//! Client-resident intercepting network cache. Every outbound request of the
//! host application passes through the proxy, which classifies it, picks a
//! caching strategy, keeps two versioned cache namespaces (long-lived static
//! assets and short-lived dynamic responses) and synthesizes a fallback when
//! the network is unavailable.
//!
//! ## Request Flow
//!
//! ```text
//! request ─▶ RequestClassifier ─▶ StrategyEngine ─┬─▶ CacheStore
//!                                                 ├─▶ Network
//!                                                 └─▶ FallbackResolver (offline)
//! ```
//!
//! The [`lifecycle`] module decides when namespaces are created and retired,
//! independently of the request flow.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use offline_proxy::cache::MemoryStore;
//! use offline_proxy::transport::HttpTransport;
//! use offline_proxy::{ProxyConfig, Registration, RequestDescriptor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> offline_proxy::Result<()> {
//!     let config = ProxyConfig::default().with_origin("http://localhost:8080");
//!     let network = Arc::new(HttpTransport::new(config.http_timeout())?);
//!     let registration = Registration::new(Arc::new(MemoryStore::new()), network);
//!
//!     registration.install(config).await?;
//!     registration.promote().await?;
//!
//!     let served = registration
//!         .handle_fetch(&RequestDescriptor::get("http://localhost:8080/app.js")?)
//!         .await?;
//!     println!("{} from {:?}", served.response.status, served.source);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Request descriptors, response snapshots, traffic classes |
//! | [`cache`] | Namespaced, versioned snapshot store |
//! | [`classifier`] | Request → traffic class |
//! | [`strategy`] | Cache-first / network-first strategies |
//! | [`fallback`] | Offline response synthesis |
//! | [`lifecycle`] | Install / activate / retire state machine |
//! | [`proxy`] | Proxy instance and client-scope registration |
//! | [`sidecar`] | Background sync, push notifications, control messages |
//! | [`dispatch`] | Event-kind → handler dispatch with a cooperative queue |
//! | [`transport`] | Network boundary |
//! | [`config`] | Configuration loading |

pub mod cache;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod fallback;
pub mod lifecycle;
pub mod proxy;
pub mod sidecar;
pub mod strategy;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::ProxyConfig;
pub use dispatch::{Dispatcher, DispatcherHandle, EventOutcome, ProxyEvent};
pub use lifecycle::LifecycleState;
pub use proxy::{ProxyInstance, Registration};
pub use strategy::{ResponseSource, Served};
pub use types::{Method, RequestDescriptor, ResponseSnapshot, TrafficClass};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};

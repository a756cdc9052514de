//! 类型系统模块：定义代理拦截的请求、响应快照与流量分类。
//!
//! # Types Module
//!
//! Core data model shared by every component of the proxy.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RequestDescriptor`] | Outbound request as seen by the proxy (method, URL, accept hint) |
//! | [`Method`] | Request method; only `GET` is ever cached |
//! | [`ResponseSnapshot`] | Immutable captured response (status, headers, body, timestamp) |
//! | [`TrafficClass`] | Category deciding which caching strategy applies |

pub mod request;
pub mod response;

pub use request::{Method, RequestDescriptor};
pub use response::ResponseSnapshot;

use serde::{Deserialize, Serialize};

/// Category assigned to a request by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficClass {
    /// Served cache-first from the `static` namespace.
    StaticAsset,
    /// Served network-first, mirrored into the `dynamic` namespace.
    CacheableApi,
    /// Relaxed network-first; opportunistically mirrored into `dynamic`.
    Uncategorized,
}

impl TrafficClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficClass::StaticAsset => "static_asset",
            TrafficClass::CacheableApi => "cacheable_api",
            TrafficClass::Uncategorized => "uncategorized",
        }
    }
}

impl std::fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

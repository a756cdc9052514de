//! Outbound request descriptor.

use crate::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(m) => m.as_str(),
        }
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        })
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request as intercepted by the proxy.
///
/// Cache identity is `(method, url)`. The accept hint only steers fallback
/// rendering and never participates in lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub accept: Option<String>,
    /// Forwarded untouched for bypassed (non-GET) requests.
    pub body: Option<Bytes>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            accept: None,
            body: None,
        }
    }

    /// Parse `url` and build a GET descriptor.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new(Method::Get, Url::parse(url)?))
    }

    pub fn post(url: &str, body: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::new(Method::Post, Url::parse(url)?).with_body(body))
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// True when the caller expects an HTML page render.
    pub fn wants_document(&self) -> bool {
        self.accept
            .as_deref()
            .map(|a| a.contains("text/html"))
            .unwrap_or(false)
    }
}

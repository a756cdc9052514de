//! Proxy configuration.
//!
//! Loaded from YAML (optional) and then overridden from the environment:
//!
//! - `OFFLINE_PROXY_CACHE_PREFIX`
//! - `OFFLINE_PROXY_VERSION`
//! - `OFFLINE_PROXY_ORIGIN`
//! - `OFFLINE_PROXY_HTTP_TIMEOUT_SECS`
//! - `OFFLINE_PROXY_AUTO_PROMOTE` (`1`/`true`)
//!
//! Traffic-class patterns are compile-time constants in [`crate::classifier`]
//! and cannot be configured here.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MANIFEST: &[&str] = &["/", "/index.html", "/app.js", "/styles.css", "/manifest.json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Prefix shared by every namespace this proxy manages.
    pub cache_prefix: String,
    /// Build version tag; namespaces tagged differently are stale.
    pub version: String,
    /// Origin that manifest paths are resolved against.
    pub origin: String,
    /// Ordered list of absolute paths fetched at install time.
    pub manifest: Vec<String>,
    /// Document served from `static` when a page render fails offline.
    pub offline_shell: String,
    pub http_timeout_secs: u64,
    /// Promote straight to Active after a successful install.
    pub auto_promote: bool,
    pub notification_title: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "offline-proxy".to_string(),
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
            origin: "http://localhost:8080".to_string(),
            manifest: DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect(),
            offline_shell: "/".to_string(),
            http_timeout_secs: 30,
            auto_promote: false,
            notification_title: "Update available".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Apply `OFFLINE_PROXY_*` overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(prefix) = env::var("OFFLINE_PROXY_CACHE_PREFIX") {
            self.cache_prefix = prefix;
        }
        if let Ok(version) = env::var("OFFLINE_PROXY_VERSION") {
            self.version = version;
        }
        if let Ok(origin) = env::var("OFFLINE_PROXY_ORIGIN") {
            self.origin = origin;
        }
        if let Some(secs) = env::var("OFFLINE_PROXY_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout_secs = secs.max(1);
        }
        if let Ok(v) = env::var("OFFLINE_PROXY_AUTO_PROMOTE") {
            self.auto_promote = matches!(v.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = manifest.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_offline_shell(mut self, shell: impl Into<String>) -> Self {
        self.offline_shell = shell.into();
        self
    }

    pub fn with_auto_promote(mut self, enable: bool) -> Self {
        self.auto_promote = enable;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn origin_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.origin)?)
    }

    /// Absolute URL for a manifest-style path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.origin_url()?.join(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        let ctx = || ErrorContext::new().with_source("config");
        if self.cache_prefix.is_empty() {
            return Err(Error::configuration_with_context(
                "cache prefix must not be empty",
                ctx().with_field_path("cache_prefix"),
            ));
        }
        if self.version.is_empty() {
            return Err(Error::configuration_with_context(
                "version must not be empty",
                ctx().with_field_path("version"),
            ));
        }
        if Url::parse(&self.origin).is_err() {
            return Err(Error::configuration_with_context(
                "origin is not a valid URL",
                ctx().with_field_path("origin").with_details(self.origin.clone()),
            ));
        }
        for (i, path) in self.manifest.iter().enumerate() {
            if !path.starts_with('/') {
                return Err(Error::configuration_with_context(
                    "manifest entries must be absolute paths",
                    ctx()
                        .with_field_path(format!("manifest[{}]", i))
                        .with_details(path.clone()),
                ));
            }
        }
        if !self.manifest.iter().any(|p| p == &self.offline_shell) {
            return Err(Error::configuration_with_context(
                "manifest must include the offline shell document",
                ctx()
                    .with_field_path("offline_shell")
                    .with_details(self.offline_shell.clone()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let cfg = ProxyConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.version.starts_with('v'));
        assert_eq!(cfg.manifest.first().map(String::as_str), Some("/"));
    }

    #[test]
    fn test_yaml_partial_overrides_defaults() {
        let cfg = ProxyConfig::from_yaml_str(
            r#"
cache_prefix: shop
version: v2.1.0
origin: https://shop.example.com
manifest: ["/", "/app.js"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.cache_prefix, "shop");
        assert_eq!(cfg.version, "v2.1.0");
        assert_eq!(cfg.manifest, vec!["/", "/app.js"]);
        assert_eq!(cfg.http_timeout_secs, 30);
        assert_eq!(
            cfg.resolve("/app.js").unwrap().as_str(),
            "https://shop.example.com/app.js"
        );
    }

    #[test]
    fn test_manifest_must_contain_shell() {
        let err = ProxyConfig::default()
            .with_manifest(["/app.js"])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("offline_shell")
        );
    }

    #[test]
    fn test_relative_manifest_entry_rejected() {
        let err = ProxyConfig::default()
            .with_manifest(["/", "app.js"])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("manifest[1]")
        );
    }

    #[test]
    fn test_bad_origin_rejected() {
        assert!(ProxyConfig::default().with_origin("not a url").validate().is_err());
    }
}

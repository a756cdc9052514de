//! Namespace naming.
//!
//! Names follow `{prefix}-{kind}-{version}`. Anything starting with
//! `{prefix}-` is considered managed by this proxy; everything else is
//! foreign and must never be touched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    Static,
    Dynamic,
}

impl NamespaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Static => "static",
            NamespaceKind::Dynamic => "dynamic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName {
    kind: NamespaceKind,
    version: String,
    rendered: String,
}

impl NamespaceName {
    pub fn new(prefix: &str, kind: NamespaceKind, version: &str) -> Self {
        Self {
            kind,
            version: version.to_string(),
            rendered: format!("{}-{}-{}", prefix, kind.as_str(), version),
        }
    }

    /// Parse a stored name back into its parts. `None` for foreign names and for
    /// managed names that do not follow the `{kind}-{version}` layout.
    pub fn parse(prefix: &str, name: &str) -> Option<Self> {
        let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
        let (kind, version) = rest.split_once('-')?;
        let kind = match kind {
            "static" => NamespaceKind::Static,
            "dynamic" => NamespaceKind::Dynamic,
            _ => return None,
        };
        if version.is_empty() {
            return None;
        }
        Some(Self::new(prefix, kind, version))
    }

    pub fn kind(&self) -> NamespaceKind {
        self.kind
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl std::fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// The pair of namespaces owned by one proxy version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    prefix: String,
    version: String,
    pub static_ns: NamespaceName,
    pub dynamic_ns: NamespaceName,
}

impl Namespaces {
    pub fn for_version(prefix: &str, version: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            version: version.to_string(),
            static_ns: NamespaceName::new(prefix, NamespaceKind::Static, version),
            dynamic_ns: NamespaceName::new(prefix, NamespaceKind::Dynamic, version),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether `name` belongs to this proxy at all (any version).
    pub fn is_recognized(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .map(|rest| rest.starts_with('-'))
            .unwrap_or(false)
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_ns.as_str() || name == self.dynamic_ns.as_str()
    }

    /// Recognized but not owned by this version.
    pub fn is_stale(&self, name: &str) -> bool {
        self.is_recognized(name) && !self.is_current(name)
    }

    /// Label reported to the host application, e.g. `offline-proxy-v1.0.0`.
    pub fn version_label(&self) -> String {
        format!("{}-{}", self.prefix, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_and_parse() {
        let ns = NamespaceName::new("app", NamespaceKind::Static, "v1.0.0");
        assert_eq!(ns.as_str(), "app-static-v1.0.0");
        assert_eq!(NamespaceName::parse("app", "app-static-v1.0.0"), Some(ns));

        let dynamic = NamespaceName::parse("app", "app-dynamic-v2-rc1").unwrap();
        assert_eq!(dynamic.kind(), NamespaceKind::Dynamic);
        assert_eq!(dynamic.version(), "v2-rc1");

        assert!(NamespaceName::parse("app", "app-v1.0.0").is_none());
        assert!(NamespaceName::parse("app", "other-static-v1").is_none());
        assert!(NamespaceName::parse("app", "app-static-").is_none());
    }

    #[test]
    fn test_recognition_and_staleness() {
        let ns = Namespaces::for_version("app", "v2");
        assert!(ns.is_recognized("app-static-v1"));
        assert!(ns.is_recognized("app-v1"));
        assert!(!ns.is_recognized("application-static-v1"));
        assert!(!ns.is_recognized("thirdparty-cache"));

        assert!(ns.is_stale("app-static-v1"));
        assert!(ns.is_stale("app-v1"));
        assert!(!ns.is_stale("app-static-v2"));
        assert!(!ns.is_stale("app-dynamic-v2"));
        assert!(!ns.is_stale("thirdparty-cache"));
        assert_eq!(ns.version_label(), "app-v2");
    }
}

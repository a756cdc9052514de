//! Request classification.
//!
//! Maps an outbound request to a [`TrafficClass`]. Matching order is fixed:
//! exact manifest path, then static file extension, then cacheable API
//! pattern, then [`TrafficClass::Uncategorized`]. Static checks win, so a path
//! that happens to match an API pattern and carries a static extension is
//! still a static asset.

use crate::types::{RequestDescriptor, TrafficClass};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Filename extensions served cache-first.
pub const STATIC_EXTENSIONS: &[&str] = &["css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "json"];

/// Path patterns for endpoints whose responses are mirrored for offline use.
/// Unanchored: a pattern matches anywhere in the path.
pub const CACHEABLE_API_PATTERNS: &[&str] = &[r"/api/health", r"/api/data"];

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\.({})$", STATIC_EXTENSIONS.join("|")))
        .expect("static extension pattern is valid")
});

static API_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    CACHEABLE_API_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("cacheable API pattern is valid"))
        .collect()
});

#[derive(Debug, Clone)]
pub struct RequestClassifier {
    manifest: HashSet<String>,
}

impl RequestClassifier {
    pub fn new<I, S>(manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            manifest: manifest.into_iter().map(Into::into).collect(),
        }
    }

    /// Total and side-effect free. Non-GET requests are classified like any
    /// other; refusing to cache them is the strategy engine's job.
    pub fn classify(&self, request: &RequestDescriptor) -> TrafficClass {
        self.classify_path(request.path())
    }

    pub fn classify_path(&self, path: &str) -> TrafficClass {
        if self.manifest.contains(path) || EXTENSION_RE.is_match(path) {
            return TrafficClass::StaticAsset;
        }
        if API_RES.iter().any(|re| re.is_match(path)) {
            return TrafficClass::CacheableApi;
        }
        TrafficClass::Uncategorized
    }

    pub fn is_manifest_path(&self, path: &str) -> bool {
        self.manifest.contains(path)
    }
}

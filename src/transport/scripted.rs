//! In-memory network for testing and demos.

use super::{Network, TransportError};
use crate::types::{RequestDescriptor, ResponseSnapshot};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// A [`Network`] answering from a fixed route table.
///
/// Routes are matched by path. Unknown paths answer 404; paths marked with
/// [`ScriptedNetwork::fail_path`] and every request while offline fail at the
/// transport level.
pub struct ScriptedNetwork {
    routes: RwLock<HashMap<String, ResponseSnapshot>>,
    failing: RwLock<HashSet<String>>,
    online: AtomicBool,
    calls: RwLock<Vec<String>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            online: AtomicBool::new(true),
            calls: RwLock::new(Vec::new()),
        }
    }

    pub fn route(&self, path: impl Into<String>, response: ResponseSnapshot) -> &Self {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(path.into(), response);
        }
        self
    }

    pub fn fail_path(&self, path: impl Into<String>) -> &Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(path.into());
        }
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// `"METHOD url"` for every fetch attempted, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for ScriptedNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, TransportError> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(format!("{} {}", request.method, request.url));
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("network offline".into()));
        }
        let path = request.path();
        let failing = self
            .failing
            .read()
            .map(|f| f.contains(path))
            .unwrap_or(false);
        if failing {
            return Err(TransportError::Unreachable(format!("connection reset: {}", path)));
        }
        let routed = self
            .routes
            .read()
            .map_err(|_| TransportError::Other("route table poisoned".into()))?
            .get(path)
            .cloned();
        Ok(routed.unwrap_or_else(|| ResponseSnapshot::new(404)))
    }
}

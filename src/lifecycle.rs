//! 生命周期模块：新版本安装、激活与旧命名空间回收。
//!
//! # Lifecycle Manager
//!
//! ```text
//! Installing --install ok--> Waiting --activate--> Active --newer active--> Redundant
//!      \--install failed------------------------------------------------------^
//! ```
//!
//! No transition is reversible. Installation is all-or-nothing: every manifest
//! asset must be fetched with a success status before anything is written, and
//! a namespace created by a failed attempt is discarded. Activation retires
//! every recognized namespace that does not belong to the incoming version and
//! waits for each deletion to finish before reporting Active.

use crate::cache::{CacheStore, Namespaces};
use crate::transport::Network;
use crate::types::{RequestDescriptor, ResponseSnapshot};
use crate::{Error, ErrorContext, Result};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    Redundant,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Installing => "installing",
            LifecycleState::Waiting => "waiting",
            LifecycleState::Active => "active",
            LifecycleState::Redundant => "redundant",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub namespace: String,
    pub assets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Namespaces deleted, in the order they were retired.
    pub retired: Vec<String>,
    /// Namespaces whose deletion failed; they stay tombstoned for this process.
    pub failed: Vec<String>,
}

/// Listing passes activation makes before reporting leftovers as failed.
const MAX_RETIREMENT_PASSES: usize = 8;

pub struct LifecycleManager {
    state: Mutex<LifecycleState>,
    store: Arc<CacheStore>,
    network: Arc<dyn Network>,
    namespaces: Namespaces,
    manifest: Vec<RequestDescriptor>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<CacheStore>,
        network: Arc<dyn Network>,
        namespaces: Namespaces,
        manifest: Vec<RequestDescriptor>,
    ) -> Self {
        Self {
            state: Mutex::new(LifecycleState::Installing),
            store,
            network,
            namespaces,
            manifest,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(LifecycleState::Redundant)
    }

    fn advance(&self, from: LifecycleState, to: LifecycleState) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| {
            Error::lifecycle_with_context(
                "lifecycle state poisoned",
                ErrorContext::new().with_source("lifecycle"),
            )
        })?;
        if *state != from {
            return Err(Error::lifecycle_with_context(
                format!("cannot move to {} from {}", to, *state),
                ErrorContext::new()
                    .with_source("lifecycle")
                    .with_details(format!("expected {}", from)),
            ));
        }
        *state = to;
        Ok(())
    }

    fn ensure(&self, expected: LifecycleState, action: &str) -> Result<()> {
        let current = self.state();
        if current != expected {
            return Err(Error::lifecycle_with_context(
                format!("cannot {} while {}", action, current),
                ErrorContext::new().with_source("lifecycle"),
            ));
        }
        Ok(())
    }

    /// `Installing → Waiting`. On failure the instance becomes Redundant.
    pub async fn install(&self) -> Result<InstallReport> {
        self.ensure(LifecycleState::Installing, "install")?;
        info!(version = self.namespaces.version(), assets = self.manifest.len(), "installing");

        match self.populate_static().await {
            Ok(report) => {
                self.advance(LifecycleState::Installing, LifecycleState::Waiting)?;
                info!(namespace = %report.namespace, assets = report.assets, "installed, waiting for activation");
                Ok(report)
            }
            Err(e) => {
                warn!(version = self.namespaces.version(), error = %e, "installation failed");
                self.make_redundant();
                Err(e)
            }
        }
    }

    async fn populate_static(&self) -> Result<InstallReport> {
        let ns = &self.namespaces.static_ns;
        let fetched = try_join_all(
            self.manifest
                .iter()
                .enumerate()
                .map(|(i, request)| self.fetch_manifest_entry(i, request)),
        )
        .await?;

        let created = self.store.open(ns).await.map_err(|e| {
            Error::installation_with_context(
                "could not open static namespace",
                ErrorContext::new()
                    .with_source("lifecycle")
                    .with_field_path(ns.to_string())
                    .with_details(e.to_string()),
            )
        })?;

        for (request, response) in &fetched {
            if let Err(e) = self.store.put_strict(ns, request, response).await {
                if created {
                    if let Err(discard) = self.store.retire(ns.as_str()).await {
                        warn!(namespace = %ns, error = %discard, "could not discard partial namespace");
                    }
                }
                return Err(Error::installation_with_context(
                    "could not store manifest asset",
                    ErrorContext::new()
                        .with_source("lifecycle")
                        .with_field_path(request.url.to_string())
                        .with_details(e.to_string()),
                ));
            }
        }

        Ok(InstallReport {
            namespace: ns.to_string(),
            assets: fetched.len(),
        })
    }

    async fn fetch_manifest_entry(
        &self,
        index: usize,
        request: &RequestDescriptor,
    ) -> Result<(RequestDescriptor, ResponseSnapshot)> {
        let ctx = || {
            ErrorContext::new()
                .with_source("lifecycle")
                .with_field_path(format!("manifest[{}]", index))
        };
        let response = self.network.fetch(request).await.map_err(|e| {
            Error::installation_with_context(
                format!("fetch of {} failed", request.url),
                ctx().with_details(e.to_string()),
            )
        })?;
        if !response.is_success() {
            return Err(Error::installation_with_context(
                format!("fetch of {} returned {}", request.url, response.status),
                ctx().with_details(format!("status {}", response.status)),
            ));
        }
        Ok((request.clone(), response))
    }

    /// `Waiting → Active`, retiring stale namespaces first.
    ///
    /// Writes into stale namespaces are fenced off before the first listing,
    /// and the store is re-listed until a pass finds nothing left to retire.
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.ensure(LifecycleState::Waiting, "activate")?;
        info!(version = self.namespaces.version(), "activating");
        self.store.fence(&self.namespaces);

        let mut report = ActivationReport::default();
        for pass in 0..MAX_RETIREMENT_PASSES {
            let names = match self.store.namespaces().await {
                Ok(names) => names,
                Err(e) => {
                    warn!(error = %e, "could not enumerate namespaces, skipping cleanup");
                    break;
                }
            };
            let pending: Vec<String> = names
                .into_iter()
                .filter(|n| self.namespaces.is_stale(n))
                .filter(|n| !report.failed.contains(n))
                .collect();
            if pending.is_empty() {
                break;
            }
            if pass + 1 == MAX_RETIREMENT_PASSES {
                warn!(remaining = pending.len(), "stale namespaces keep reappearing, giving up");
                report.failed.extend(pending);
                break;
            }
            for name in pending {
                info!(namespace = %name, "deleting old namespace");
                match self.store.retire(&name).await {
                    Ok(_) => {
                        if !report.retired.contains(&name) {
                            report.retired.push(name);
                        }
                    }
                    Err(e) => {
                        warn!(namespace = %name, error = %e, "namespace deletion failed");
                        report.failed.push(name);
                    }
                }
            }
        }

        self.advance(LifecycleState::Waiting, LifecycleState::Active)?;
        info!(version = self.namespaces.version(), retired = report.retired.len(), "active");
        Ok(report)
    }

    /// Terminal. Seals the store handle so no further cache writes happen.
    pub fn make_redundant(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = LifecycleState::Redundant;
        }
        self.store.seal();
    }
}

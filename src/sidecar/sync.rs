//! Deferred-mutation replay trigger.
//!
//! The proxy keeps no queue of failed mutations. It only guarantees that the
//! registered [`ReplayHook`] runs at most once per connectivity restoration,
//! however many `online`/`sync` signals arrive for it.

use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The only sync tag that triggers a replay.
pub const SYNC_TAG: &str = "background-sync";

#[async_trait]
pub trait ReplayHook: Send + Sync {
    async fn replay(&self) -> Result<()>;
}

/// Default hook: nothing is queued, so nothing is replayed.
pub struct NoopReplay;

#[async_trait]
impl ReplayHook for NoopReplay {
    async fn replay(&self) -> Result<()> {
        debug!("no deferred mutations to replay");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Replayed,
    AlreadyReplayed,
    Ignored,
    Failed(String),
}

pub struct ReplayTrigger {
    hook: Arc<dyn ReplayHook>,
    /// Restorations observed so far.
    generation: AtomicU64,
    /// Highest generation the hook has been claimed for.
    fired: AtomicU64,
}

impl ReplayTrigger {
    pub fn new(hook: Arc<dyn ReplayHook>) -> Self {
        Self {
            hook,
            generation: AtomicU64::new(0),
            fired: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Connectivity came back: start a new restoration and replay for it.
    pub async fn connectivity_restored(&self) -> ReplayOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.fire(generation).await
    }

    /// A sync event from the host. A sync with no prior restoration counts as one.
    pub async fn on_sync(&self, tag: &str) -> ReplayOutcome {
        if tag != SYNC_TAG {
            debug!(tag, "ignoring sync event");
            return ReplayOutcome::Ignored;
        }
        // Only one concurrent sync can open the first restoration.
        let generation = match self
            .generation
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => 1,
            Err(current) => current,
        };
        self.fire(generation).await
    }

    async fn fire(&self, generation: u64) -> ReplayOutcome {
        // fetch_max hands each generation to exactly one caller.
        if self.fired.fetch_max(generation, Ordering::SeqCst) >= generation {
            return ReplayOutcome::AlreadyReplayed;
        }
        info!(generation, "performing background sync");
        match self.hook.replay().await {
            Ok(()) => ReplayOutcome::Replayed,
            Err(e) => {
                warn!(generation, error = %e, "background sync failed");
                ReplayOutcome::Failed(e.to_string())
            }
        }
    }
}

impl Default for ReplayTrigger {
    fn default() -> Self {
        Self::new(Arc::new(NoopReplay))
    }
}

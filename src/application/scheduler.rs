//! Deferred side effects of a state commit. The store stays pure; after
//! every commit the command layer notifies this scheduler, which owns the
//! two timing policies:
//!
//! * snapshot persistence is trailing-edge debounced through a generation
//!   counter, so a burst of edits produces exactly one write;
//! * remote auto-sync fires one independent delayed upload per task
//!   mutation (deliberately not coalesced; redundant uploads are cheap
//!   and the busy flag serializes overlap).

use crate::application::github_sync::GitHubSyncService;
use crate::application::store::Store;
use crate::infrastructure::github_client::GitHubClient;
use crate::infrastructure::snapshot_store::SnapshotStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::sleep;

/// What a commit touched; task data is what the remote store mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    TaskData,
    Other,
}

pub struct EffectScheduler<C: GitHubClient, P: SnapshotStore> {
    runtime: Handle,
    store: Arc<Mutex<Store>>,
    snapshots: Arc<P>,
    sync: Arc<GitHubSyncService<C>>,
    persist_delay: Duration,
    sync_delay: Duration,
    persist_generation: Arc<AtomicU64>,
}

impl<C, P> EffectScheduler<C, P>
where
    C: GitHubClient + 'static,
    P: SnapshotStore + 'static,
{
    pub fn new(
        runtime: Handle,
        store: Arc<Mutex<Store>>,
        snapshots: Arc<P>,
        sync: Arc<GitHubSyncService<C>>,
        persist_delay: Duration,
        sync_delay: Duration,
    ) -> Self {
        Self {
            runtime,
            store,
            snapshots,
            sync,
            persist_delay,
            sync_delay,
            persist_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn notify_commit(&self, change: StateChange) {
        self.schedule_persist();
        if change == StateChange::TaskData {
            self.schedule_sync();
        }
    }

    /// Trailing-edge debounce: every call claims a new generation and only
    /// the newest one still matching after the quiet period writes.
    fn schedule_persist(&self) {
        let generation = self.persist_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.persist_generation);
        let store = Arc::clone(&self.store);
        let snapshots = Arc::clone(&self.snapshots);
        let delay = self.persist_delay;

        self.runtime.spawn(async move {
            sleep(delay).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let snapshot = match store.lock() {
                Ok(store) => store.state().clone(),
                Err(_) => return,
            };
            // Best effort; the next commit schedules another attempt.
            let _ = snapshots.save(&snapshot);
        });
    }

    /// Fire-and-forget: failures (including the busy-flag rejection) are
    /// already recorded in `SyncStatus` by the service.
    fn schedule_sync(&self) {
        let sync = Arc::clone(&self.sync);
        let delay = self.sync_delay;

        self.runtime.spawn(async move {
            sleep(delay).await;
            let _ = sync.upload().await;
        });
    }
}

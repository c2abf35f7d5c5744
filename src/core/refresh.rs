//! Debounced authoritative refetch after writes.
//!
//! The backend is eventually consistent, so re-reading immediately after a
//! write can return stale rows. Each write schedules a refresh that waits
//! for the settle delay; refreshes scheduled in the meantime collapse into
//! the latest one, which refetches every module touched since.

use crate::core::state::Shared;
use crate::domain::model::ModuleId;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub(crate) struct RefreshScheduler {
    delay: Duration,
    generation: AtomicU64,
    pending: Mutex<BTreeSet<ModuleId>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: AtomicU64::new(0),
            pending: Mutex::new(BTreeSet::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Queue modules for refetch and restart the settle timer. An empty
    /// module set still triggers a shortage recompute.
    pub fn schedule(shared: &Arc<Shared>, modules: impl IntoIterator<Item = ModuleId>) {
        let scheduler = &shared.refresh;
        scheduler
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(modules);
        let generation = scheduler.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = tokio::spawn(run(Arc::clone(shared), generation));
        let mut tasks = scheduler.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Wait until every scheduled refresh has finished.
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<JoinHandle<()>> =
                std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::warn!("Refresh task ended abnormally: {}", e);
                }
            }
        }
    }

    fn take_pending(&self) -> Vec<ModuleId> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
            .into_iter()
            .collect()
    }
}

async fn run(shared: Arc<Shared>, generation: u64) {
    if !shared.refresh.delay.is_zero() {
        tokio::time::sleep(shared.refresh.delay).await;
    }
    if shared.refresh.generation.load(Ordering::SeqCst) != generation {
        tracing::debug!("Refresh {} superseded by a newer write", generation);
        return;
    }

    let modules = shared.refresh.take_pending();
    refetch(&shared, &modules).await;

    let mut state = shared.state.write().await;
    state.recompute_shortages(&shared.matching, &shared.settings.semesters);
}

/// Overwrite local bindings of `modules` with what the backend reports.
/// A failed read keeps the local view.
pub(crate) async fn refetch(shared: &Shared, modules: &[ModuleId]) {
    if modules.is_empty() {
        return;
    }

    match shared.api.batch_get_assignments(modules).await {
        Ok(mut fresh) => {
            let mut state = shared.state.write().await;
            for module_id in modules {
                let assignments = fresh.remove(module_id).unwrap_or_default();
                state.store.replace_module(module_id, assignments);
            }
            tracing::debug!("Refetched assignments for {} modules", modules.len());
        }
        Err(e) => {
            tracing::warn!("Refetch of {} modules failed, keeping local state: {}", modules.len(), e);
        }
    }
}

//! Keeps every registered data collection in step with the filter selection.
//!
//! On each dispatch the live selection is resolved once and handed to every
//! store. A store that is already `Ready` for that exact range is skipped,
//! unless the user explicitly asked for a refresh. Stores fetch concurrently
//! and independently: a failing store only records its own error.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
    clock::Clock,
    filter::{ResolvedRange, resolve},
    state::FilterState,
    store::{FetchOutcome, FetchStatus, Refetch},
};

/// Why a dispatch happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// The selection changed (or the view was opened).
    SelectionChanged,
    /// Explicit user refresh: no store is skipped.
    Refresh,
}

/// Aggregate state of the filter-to-data pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Dispatching,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreReport {
    Skipped,
    Fetched(FetchOutcome),
    /// The fetch task panicked or was cancelled.
    Aborted,
}

/// Per-store result of one dispatch, in registration order.
#[derive(Clone, Debug)]
pub struct DispatchReport {
    pub range: ResolvedRange,
    pub stores: Vec<(String, StoreReport)>,
}

impl DispatchReport {
    pub fn fetched(&self) -> usize {
        self.stores
            .iter()
            .filter(|(_, report)| matches!(report, StoreReport::Fetched(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.stores
            .iter()
            .filter(|(_, report)| *report == StoreReport::Skipped)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &crate::FetchError)> {
        self.stores.iter().filter_map(|(name, report)| match report {
            StoreReport::Fetched(FetchOutcome::Failed(err)) => Some((name.as_str(), err)),
            _ => None,
        })
    }

    pub fn get(&self, name: &str) -> Option<&StoreReport> {
        self.stores
            .iter()
            .find_map(|(store, report)| (store == name).then_some(report))
    }
}

pub struct FetchOrchestrator {
    filter: FilterState,
    clock: Arc<dyn Clock>,
    stores: Vec<Arc<dyn Refetch>>,
}

impl FetchOrchestrator {
    pub fn new(filter: FilterState, clock: Arc<dyn Clock>) -> Self {
        Self {
            filter,
            clock,
            stores: Vec::new(),
        }
    }

    pub fn register(&mut self, store: Arc<dyn Refetch>) -> &mut Self {
        self.stores.push(store);
        self
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Resolves the live selection against the injected clock.
    pub fn current_range(&self) -> ResolvedRange {
        resolve(&self.filter.selection(), self.clock.today())
    }

    /// `Dispatching` while any registered store is loading.
    pub async fn pipeline_state(&self) -> PipelineState {
        for store in &self.stores {
            if store.status().await == FetchStatus::Loading {
                return PipelineState::Dispatching;
            }
        }
        PipelineState::Idle
    }

    /// `true` once every store has been asked for `range` and none is loading.
    pub async fn settled_for(&self, range: &ResolvedRange) -> bool {
        for store in &self.stores {
            if store.status().await == FetchStatus::Loading
                || store.requested().await.as_ref() != Some(range)
            {
                return false;
            }
        }
        true
    }

    /// Resolves once and refetches every store that needs it, concurrently.
    ///
    /// Returns when all issued fetches have settled. Fetches run as detached
    /// tasks: dropping the returned future stops the report, not the fetches.
    pub async fn dispatch(&self, trigger: Trigger) -> DispatchReport {
        let range = self.current_range();
        tracing::info!(?trigger, %range, stores = self.stores.len(), "dispatching");

        let mut reports: Vec<(String, StoreReport)> = Vec::with_capacity(self.stores.len());
        let mut pending = Vec::new();

        for (index, store) in self.stores.iter().enumerate() {
            let name = store.name().to_string();
            if trigger == Trigger::SelectionChanged && store.is_fresh_for(&range).await {
                tracing::debug!(store = %name, "already fresh, skipping");
                reports.push((name, StoreReport::Skipped));
                continue;
            }
            reports.push((name, StoreReport::Aborted));
            let store = Arc::clone(store);
            pending.push((
                index,
                tokio::spawn(async move { store.refetch(range).await }),
            ));
        }

        for (index, handle) in pending {
            match handle.await {
                Ok(outcome) => {
                    if let Some((_, report)) = reports.get_mut(index) {
                        *report = StoreReport::Fetched(outcome);
                    }
                }
                Err(err) => tracing::error!("fetch task failed: {err}"),
            }
        }

        DispatchReport {
            range,
            stores: reports,
        }
    }

    /// Follows the filter in the background.
    ///
    /// Every committed selection change starts a new dispatch right away,
    /// without waiting for the previous one; stale responses are dropped by
    /// the stores themselves. The task ends when the returned handle is
    /// aborted; fetches it already issued still settle their stores.
    pub fn spawn(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        let mut rx = this.filter.subscribe();
        tokio::spawn(async move {
            let mut dispatches = JoinSet::new();
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let this = Arc::clone(&this);
                        dispatches.spawn(async move {
                            this.dispatch(Trigger::SelectionChanged).await
                        });
                    }
                    Some(done) = dispatches.join_next(), if !dispatches.is_empty() => {
                        if let Err(err) = done {
                            tracing::error!("dispatch task failed: {err}");
                        }
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for FetchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchOrchestrator")
            .field("filter", &self.filter.selection())
            .field(
                "stores",
                &self.stores.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

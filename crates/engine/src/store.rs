//! Fetched datasets and their load lifecycle.
//!
//! Each [`DataCollectionStore`] exclusively owns one dataset (the totals
//! summary, the transaction list, a category breakdown, ...). A fetch moves it
//! through `Loading` and then `Ready` or `Failed`. Requests are numbered when
//! issued; a response whose number is older than the latest issued one is
//! dropped, so the store always settles on the last request made, whatever
//! order the responses arrive in.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{FetchError, filter::ResolvedRange};

/// Transport for one endpoint.
#[async_trait]
pub trait Source<T>: Send + Sync {
    async fn fetch(&self, range: &ResolvedRange) -> Result<Vec<T>, FetchError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What happened to one fetch once its response came back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Failed(FetchError),
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
}

/// Point-in-time view of a store.
#[derive(Debug)]
pub struct DataCollection<T> {
    /// Server order, never re-sorted.
    pub items: Arc<Vec<T>>,
    pub status: FetchStatus,
    /// Set only while `status` is `Failed`.
    pub error: Option<FetchError>,
    /// Range that produced `items`, `None` until the first success.
    pub range: Option<ResolvedRange>,
}

impl<T> Clone for DataCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            status: self.status,
            error: self.error.clone(),
            range: self.range,
        }
    }
}

impl<T> Default for DataCollection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            status: FetchStatus::Idle,
            error: None,
            range: None,
        }
    }
}

impl<T> DataCollection<T> {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// `true` when `items` were fetched for `range`.
    ///
    /// Responses may land after the selection moved on; callers needing strict
    /// consistency compare against the live range with this.
    pub fn is_current_for(&self, range: &ResolvedRange) -> bool {
        self.range.as_ref() == Some(range)
    }
}

#[derive(Debug)]
struct Inner<T> {
    collection: DataCollection<T>,
    /// Sequence number of the latest issued request.
    issued: u64,
    /// Range of the latest issued request.
    requested: Option<ResolvedRange>,
}

pub struct DataCollectionStore<T> {
    name: String,
    source: Arc<dyn Source<T>>,
    inner: RwLock<Inner<T>>,
}

impl<T> std::fmt::Debug for DataCollectionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCollectionStore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> DataCollectionStore<T> {
    pub fn new(name: impl Into<String>, source: Arc<dyn Source<T>>) -> Self {
        Self {
            name: name.into(),
            source,
            inner: RwLock::new(Inner {
                collection: DataCollection::default(),
                issued: 0,
                requested: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn snapshot(&self) -> DataCollection<T> {
        self.inner.read().await.collection.clone()
    }

    pub async fn status(&self) -> FetchStatus {
        self.inner.read().await.collection.status
    }

    /// `Ready` with items fetched for exactly `range` by the latest request.
    pub async fn is_fresh_for(&self, range: &ResolvedRange) -> bool {
        let inner = self.inner.read().await;
        inner.collection.status == FetchStatus::Ready && inner.requested.as_ref() == Some(range)
    }

    /// Range of the latest issued request, answered or not.
    pub async fn requested(&self) -> Option<ResolvedRange> {
        self.inner.read().await.requested
    }

    /// Fetches `range` and applies the response unless it went stale.
    ///
    /// Previous items stay visible while loading. On success they are replaced
    /// wholesale; on failure they are kept and the error is recorded.
    pub async fn fetch(&self, range: ResolvedRange) -> FetchOutcome {
        let seq = {
            let mut inner = self.inner.write().await;
            inner.issued += 1;
            inner.requested = Some(range);
            inner.collection.status = FetchStatus::Loading;
            inner.collection.error = None;
            inner.issued
        };
        tracing::debug!(store = %self.name, seq, %range, "fetch issued");

        let result = self.source.fetch(&range).await;

        let mut inner = self.inner.write().await;
        if seq < inner.issued {
            tracing::debug!(
                store = %self.name,
                seq,
                latest = inner.issued,
                "dropping stale response"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(items) => {
                tracing::debug!(store = %self.name, seq, items = items.len(), "fetch applied");
                inner.collection = DataCollection {
                    items: Arc::new(items),
                    status: FetchStatus::Ready,
                    error: None,
                    range: Some(range),
                };
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(store = %self.name, seq, "fetch failed: {err}");
                inner.collection.status = FetchStatus::Failed;
                inner.collection.error = Some(err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }
}

/// Type-erased view of a store, as driven by the orchestrator.
#[async_trait]
pub trait Refetch: Send + Sync {
    fn name(&self) -> &str;
    async fn status(&self) -> FetchStatus;
    async fn is_fresh_for(&self, range: &ResolvedRange) -> bool;
    async fn requested(&self) -> Option<ResolvedRange>;
    async fn refetch(&self, range: ResolvedRange) -> FetchOutcome;
}

#[async_trait]
impl<T: Send + Sync + 'static> Refetch for DataCollectionStore<T> {
    fn name(&self) -> &str {
        DataCollectionStore::name(self)
    }

    async fn status(&self) -> FetchStatus {
        DataCollectionStore::status(self).await
    }

    async fn is_fresh_for(&self, range: &ResolvedRange) -> bool {
        DataCollectionStore::is_fresh_for(self, range).await
    }

    async fn requested(&self) -> Option<ResolvedRange> {
        DataCollectionStore::requested(self).await
    }

    async fn refetch(&self, range: ResolvedRange) -> FetchOutcome {
        self.fetch(range).await
    }
}

//! Per-instance fetch orchestration.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anymodal_core::logging::{span_names, targets};
use anymodal_core::{AsyncCancellationToken, AsyncTaskHandle, Store, spawn_on};
use futures_util::future::try_join_all;
use tokio::runtime::Handle;
use tracing::Instrument;

use super::{FetchState, Fetcher};
use crate::error::{ModalError, Result};

/// Runs the fetchers of one mounted modal instance and owns its
/// [`FetchState`].
///
/// The controller is bound to a single instance for its whole life. Tearing
/// it down cancels its mount guard: fetches already in flight still complete,
/// but their results are discarded instead of written.
pub struct FetchController<I, T> {
    instance: Arc<I>,
    fetchers: Vec<Fetcher<I, T>>,
    state: Store<FetchState<T>>,
    guard: AsyncCancellationToken,
    runtime: Handle,
    mounted: AtomicBool,
}

impl<I, T> FetchController<I, T>
where
    I: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller in the initial loading state. Nothing runs until
    /// [`mount`](Self::mount).
    pub fn new(instance: Arc<I>, fetchers: Vec<Fetcher<I, T>>, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            instance,
            fetchers,
            state: Store::new(FetchState::loading()),
            guard: AsyncCancellationToken::new(),
            runtime,
            mounted: AtomicBool::new(false),
        })
    }

    /// The instance this controller loads data for.
    pub fn instance(&self) -> &Arc<I> {
        &self.instance
    }

    /// Number of fetchers.
    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    /// Whether the controller has no fetchers.
    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// The state store, for subscriptions.
    pub fn store(&self) -> &Store<FetchState<T>> {
        &self.state
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState<T> {
        self.state.snapshot()
    }

    /// Start the initial load. Only the first call has an effect.
    pub fn mount(self: &Arc<Self>) -> bool {
        if self.mounted.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::trace!(target: targets::FETCH, fetchers = self.fetchers.len(), "fetch controller mounted");
        self.spawn_update_all();
        true
    }

    /// Cancel the mount guard. Later writes are discarded.
    pub fn teardown(&self) {
        if self.guard.cancel() {
            tracing::trace!(target: targets::FETCH, "fetch controller torn down");
        }
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.guard.is_cancelled()
    }

    /// Re-run every fetcher.
    ///
    /// Sets `is_loading` and clears the error first. On success all data is
    /// replaced; on the first failure data is dropped and the error recorded.
    pub async fn update_all(&self) -> Result<()> {
        self.write(|state| {
            state.is_loading = true;
            state.error = None;
        })?;

        let batch = self.fetchers.iter().map(|fetcher| fetcher.call(&self.instance));
        match try_join_all(batch).await {
            Ok(data) => self.write(|state| {
                state.is_loading = false;
                state.error = None;
                state.data = Some(data);
            }),
            Err(error) => {
                tracing::debug!(target: targets::FETCH, %error, "fetch failed");
                self.write(|state| {
                    state.is_loading = false;
                    state.error = Some(error);
                    state.data = None;
                })
            }
        }
    }

    /// Re-run the fetcher at `index` only.
    ///
    /// On success the result replaces that slot, provided data is present;
    /// `is_loading` and `error` are left alone. On failure the error is
    /// recorded and existing data is kept.
    pub async fn update(&self, index: usize) -> Result<()> {
        let fetcher = self.fetchers.get(index).ok_or(ModalError::FetcherIndexOutOfRange {
            index,
            len: self.fetchers.len(),
        })?;
        if self.is_torn_down() {
            return Err(ModalError::TornDown);
        }

        match fetcher.call(&self.instance).await {
            Ok(value) => self.write(|state| {
                if let Some(slot) = state.data.as_mut().and_then(|data| data.get_mut(index)) {
                    *slot = value;
                }
            }),
            Err(error) => {
                tracing::debug!(target: targets::FETCH, index, %error, "refresh failed");
                self.write(|state| state.error = Some(error))
            }
        }
    }

    /// Run [`update_all`](Self::update_all) on the controller's runtime.
    pub fn spawn_update_all(self: &Arc<Self>) -> AsyncTaskHandle<Result<()>> {
        let this = self.clone();
        let span = tracing::debug_span!(target: targets::FETCH, span_names::FETCH, index = "all");
        spawn_on(&self.runtime, async move { this.update_all().await }.instrument(span))
    }

    /// Run [`update`](Self::update) on the controller's runtime.
    pub fn spawn_update(self: &Arc<Self>, index: usize) -> AsyncTaskHandle<Result<()>> {
        let this = self.clone();
        let span = tracing::debug_span!(target: targets::FETCH, span_names::FETCH, index);
        spawn_on(&self.runtime, async move { this.update(index).await }.instrument(span))
    }

    fn write(&self, f: impl FnOnce(&mut FetchState<T>)) -> Result<()> {
        if self.guard.is_cancelled() {
            tracing::trace!(target: targets::FETCH, "discarding write after teardown");
            return Err(ModalError::TornDown);
        }
        self.state.update(f);
        Ok(())
    }
}

impl<I, T: fmt::Debug> fmt::Debug for FetchController<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchController")
            .field("fetchers", &self.fetchers.len())
            .field("state", &self.state)
            .field("torn_down", &self.guard.is_cancelled())
            .finish()
    }
}

/// Reload handle for one fetcher, handed to content renderers.
pub struct Refresh<I, T> {
    controller: Arc<FetchController<I, T>>,
    index: usize,
}

impl<I, T> Refresh<I, T>
where
    I: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(controller: Arc<FetchController<I, T>>, index: usize) -> Self {
        Self { controller, index }
    }

    /// The fetcher index this handle reloads.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reload and wait for the result to be applied.
    pub async fn run(&self) -> Result<()> {
        self.controller.update(self.index).await
    }

    /// Reload in the background.
    pub fn spawn(&self) -> AsyncTaskHandle<Result<()>> {
        self.controller.spawn_update(self.index)
    }
}

impl<I, T> Clone for Refresh<I, T> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            index: self.index,
        }
    }
}

impl<I, T> fmt::Debug for Refresh<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresh").field("index", &self.index).finish()
    }
}

/// Reload handle for every fetcher, handed to content renderers.
pub struct RefreshAll<I, T> {
    controller: Arc<FetchController<I, T>>,
}

impl<I, T> RefreshAll<I, T>
where
    I: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(controller: Arc<FetchController<I, T>>) -> Self {
        Self { controller }
    }

    /// Reload everything and wait for the result to be applied.
    pub async fn run(&self) -> Result<()> {
        self.controller.update_all().await
    }

    /// Reload everything in the background.
    pub fn spawn(&self) -> AsyncTaskHandle<Result<()>> {
        self.controller.spawn_update_all()
    }
}

impl<I, T> Clone for RefreshAll<I, T> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<I, T> fmt::Debug for RefreshAll<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshAll").finish_non_exhaustive()
    }
}

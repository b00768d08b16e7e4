//! Asynchronous data loading for modals.
//!
//! A fetch-backed modal declares one or more [`Fetcher`]s. When an instance
//! of the modal is first rendered, a [`FetchController`] is mounted for it and
//! runs every fetcher concurrently; until they all settle, the system's loader
//! renderer is shown. The content renderer then receives the results together
//! with [`Refresh`] handles for manual reloads.
//!
//! # State Machine
//!
//! ```text
//! Idle -> Loading -> Ready | Failed
//! Ready -> Ready                      (per-index or full refresh succeeded)
//! Ready -> Loading -> Ready | Failed  (full refresh)
//! ```
//!
//! A failed load drops all data. A failed per-index refresh records the error
//! but leaves the previous data in place; the error still wins the rendering
//! decision, so the error renderer is shown until a full refresh succeeds.

mod controller;
mod renderer;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::FetchError;
use crate::modal::{Modal, ModalVariant};

pub use controller::{FetchController, Refresh, RefreshAll};
pub use renderer::{ListProps, SingleProps};
pub(crate) use renderer::{Content, FetchPresenters, FetchRenderer};

/// The future a fetcher produces.
pub type FetchFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

/// An asynchronous function loading one piece of data for an instance `I`.
pub struct Fetcher<I, T> {
    call: Arc<dyn Fn(&I) -> FetchFuture<T> + Send + Sync>,
}

impl<I: 'static, T: 'static> Fetcher<I, T> {
    /// Wrap an async function of the instance.
    ///
    /// The function borrows the instance only while building the future, so
    /// copy out whatever the future needs:
    ///
    /// ```
    /// use anymodal::{FetchError, Fetcher};
    ///
    /// struct Post { post_id: u64 }
    ///
    /// let fetcher = Fetcher::new(|post: &Post| {
    ///     let id = post.post_id;
    ///     async move { Ok::<_, FetchError>(format!("Post {id}")) }
    /// });
    /// # let _ = fetcher;
    /// ```
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn(&I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<FetchError> + 'static,
    {
        Self {
            call: Arc::new(move |instance: &I| f(instance).map(|r| r.map_err(Into::into)).boxed()),
        }
    }

    /// Start a fetch for `instance`.
    pub fn call(&self, instance: &I) -> FetchFuture<T> {
        (self.call)(instance)
    }

    /// Lift a fetcher over a payload into one over the whole modal union.
    pub(crate) fn narrowed<M>(self) -> Fetcher<M, T>
    where
        M: Modal,
        I: ModalVariant<M>,
    {
        let call = self.call;
        Fetcher {
            call: Arc::new(move |modal: &M| match I::narrow(modal) {
                Some(payload) => call(payload),
                None => {
                    let message = format!("modal `{}` is not a `{}` variant", modal.tag(), I::TAG);
                    async move { Err(FetchError::msg(message)) }.boxed()
                }
            }),
        }
    }
}

impl<I, T> Clone for Fetcher<I, T> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
        }
    }
}

impl<I, T> fmt::Debug for Fetcher<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

type DeriveFn<P, T> = Arc<dyn Fn(&P) -> Vec<Fetcher<P, T>> + Send + Sync>;

/// Which fetchers a modal runs.
pub enum FetcherSpec<P, T> {
    /// One fetcher; content sees the bare value.
    Single(Fetcher<P, T>),
    /// A fixed, ordered list of fetchers.
    List(Vec<Fetcher<P, T>>),
    /// A list derived from each modal instance when it mounts.
    Derived(DeriveFn<P, T>),
}

impl<P, T> FetcherSpec<P, T> {
    /// Derive the fetcher list from the instance.
    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&P) -> Vec<Fetcher<P, T>> + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(derive))
    }

    /// Whether content is handed a list rather than a single value.
    pub fn is_list(&self) -> bool {
        !matches!(self, Self::Single(_))
    }

    /// The fetchers to run for `instance`, in order.
    pub fn resolve(&self, instance: &P) -> Vec<Fetcher<P, T>> {
        match self {
            Self::Single(fetcher) => vec![fetcher.clone()],
            Self::List(fetchers) => fetchers.clone(),
            Self::Derived(derive) => derive(instance),
        }
    }
}

impl<P, T> From<Fetcher<P, T>> for FetcherSpec<P, T> {
    fn from(fetcher: Fetcher<P, T>) -> Self {
        Self::Single(fetcher)
    }
}

impl<P, T> From<Vec<Fetcher<P, T>>> for FetcherSpec<P, T> {
    fn from(fetchers: Vec<Fetcher<P, T>>) -> Self {
        Self::List(fetchers)
    }
}

impl<P, T, const N: usize> From<[Fetcher<P, T>; N]> for FetcherSpec<P, T> {
    fn from(fetchers: [Fetcher<P, T>; N]) -> Self {
        Self::List(fetchers.into())
    }
}

/// Loading, error and data of one mounted modal instance.
#[derive(Clone)]
pub struct FetchState<T> {
    /// A full load is in flight.
    pub is_loading: bool,
    /// The most recent failure, if any.
    pub error: Option<FetchError>,
    /// One result per fetcher, in fetcher order.
    pub data: Option<Vec<T>>,
}

/// The rendering decision derived from a [`FetchState`].
#[derive(Debug)]
pub enum FetchPhase<'a, T> {
    /// Show the loader.
    Loading,
    /// Show the error renderer.
    Failed(&'a FetchError),
    /// Show the content.
    Ready(&'a [T]),
}

impl<T> FetchState<T> {
    /// The state of a freshly mounted instance.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            error: None,
            data: None,
        }
    }

    /// Error wins over loading, loading wins over data.
    pub fn phase(&self) -> FetchPhase<'_, T> {
        if let Some(error) = &self.error {
            return FetchPhase::Failed(error);
        }
        match &self.data {
            Some(data) if !self.is_loading => FetchPhase::Ready(data),
            _ => FetchPhase::Loading,
        }
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T: fmt::Debug> fmt::Debug for FetchState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchState")
            .field("is_loading", &self.is_loading)
            .field("error", &self.error)
            .field("data", &self.data)
            .finish()
    }
}

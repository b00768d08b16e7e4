//! The renderer behind `create_with_fetch`.

use std::fmt;
use std::sync::Arc;

use anymodal_core::logging::targets;
use anymodal_core::{AsyncRuntime, Signal};
use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::{FetchController, FetchPhase, Fetcher, FetcherSpec, Refresh, RefreshAll};
use crate::error::{FetchError, Result};
use crate::modal::{Modal, ModalVariant};
use crate::registry::{ModalRenderer, warn_variant_mismatch};

pub(crate) type LoaderFn<M, V> = Arc<dyn Fn(&M) -> Option<V> + Send + Sync>;
pub(crate) type ErrorFn<V> = Arc<dyn Fn(&FetchError) -> Option<V> + Send + Sync>;

/// Props of a single-fetcher content renderer.
pub struct SingleProps<'a, P, M, T> {
    /// The narrowed modal payload.
    pub modal: &'a P,
    /// The fetched value.
    pub data: &'a T,
    /// Reload the value.
    pub update: Refresh<M, T>,
    /// Reload the value, passing through the loading state.
    pub update_all: RefreshAll<M, T>,
}

/// Props of a multi-fetcher content renderer.
pub struct ListProps<'a, P, M, T> {
    /// The narrowed modal payload.
    pub modal: &'a P,
    /// One value per fetcher, in fetcher order.
    pub data: &'a [T],
    /// One reload handle per fetcher.
    pub update: Vec<Refresh<M, T>>,
    /// Reload everything.
    pub update_all: RefreshAll<M, T>,
}

type SingleContent<P, M, T, V> = Box<dyn Fn(SingleProps<'_, P, M, T>) -> V + Send + Sync>;
type ListContent<P, M, T, V> = Box<dyn Fn(ListProps<'_, P, M, T>) -> V + Send + Sync>;

pub(crate) enum Content<P, M, T, V> {
    Single(SingleContent<P, M, T, V>),
    List(ListContent<P, M, T, V>),
}

/// System-wide pieces every fetch renderer shares.
pub(crate) struct FetchPresenters<M, V> {
    pub(crate) loader: Option<LoaderFn<M, V>>,
    pub(crate) error: Option<ErrorFn<V>>,
    pub(crate) runtime: Option<Handle>,
    pub(crate) redraw: Arc<Signal<()>>,
}

impl<M, V> FetchPresenters<M, V> {
    fn loading(&self, modal: &M) -> Option<V> {
        self.loader.as_ref().and_then(|loader| loader(modal))
    }

    fn failed(&self, error: &FetchError) -> Option<V> {
        self.error.as_ref().and_then(|render| render(error))
    }

    fn runtime(&self) -> Result<Handle> {
        if let Some(handle) = &self.runtime {
            return Ok(handle.clone());
        }
        if let Ok(handle) = Handle::try_current() {
            return Ok(handle);
        }
        Ok(AsyncRuntime::global()?.handle().clone())
    }
}

impl<M, V> Clone for FetchPresenters<M, V> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            error: self.error.clone(),
            runtime: self.runtime.clone(),
            redraw: self.redraw.clone(),
        }
    }
}

/// The instance a fetch renderer is currently bound to.
struct Slot<M, T> {
    instance: Arc<M>,
    /// Outlets currently showing `instance`.
    outlets: usize,
    controller: Option<Arc<FetchController<M, T>>>,
}

impl<M, T> Slot<M, T>
where
    M: Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn new(instance: &Arc<M>, outlets: usize) -> Self {
        Self {
            instance: instance.clone(),
            outlets,
            controller: None,
        }
    }

    fn teardown(&self) {
        if let Some(controller) = &self.controller {
            controller.teardown();
        }
    }
}

/// Mounts one [`FetchController`] per modal instance and picks between the
/// loader, the error renderer and the content.
///
/// Outlets sharing the renderer share the controller; it is torn down when
/// the last of them unmounts the instance, or when another instance is
/// mounted.
pub(crate) struct FetchRenderer<P, M, T, V> {
    spec: FetcherSpec<P, T>,
    content: Content<P, M, T, V>,
    presenters: FetchPresenters<M, V>,
    slot: Mutex<Option<Slot<M, T>>>,
}

impl<P, M, T, V> FetchRenderer<P, M, T, V>
where
    M: Modal,
    P: ModalVariant<M>,
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        spec: FetcherSpec<P, T>,
        content: Content<P, M, T, V>,
        presenters: FetchPresenters<M, V>,
    ) -> Self {
        Self {
            spec,
            content,
            presenters,
            slot: Mutex::new(None),
        }
    }

    /// The controller for `modal`, mounting a new one if the instance changed.
    fn controller_for(&self, modal: &Arc<M>, payload: &P) -> Result<Arc<FetchController<M, T>>> {
        let mut guard = self.slot.lock();
        let bound = guard
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(&current.instance, modal));
        if !bound {
            if let Some(stale) = guard.take() {
                stale.teardown();
            }
        }
        let slot = guard.get_or_insert_with(|| Slot::new(modal, 0));
        if let Some(controller) = &slot.controller {
            return Ok(controller.clone());
        }

        let runtime = self.presenters.runtime()?;
        let fetchers = self
            .spec
            .resolve(payload)
            .into_iter()
            .map(Fetcher::narrowed)
            .collect();
        let controller = FetchController::new(modal.clone(), fetchers, runtime);

        let redraw = self.presenters.redraw.clone();
        controller.store().subscribe(move || redraw.emit(()));

        tracing::debug!(target: targets::FETCH, tag = P::TAG, fetchers = controller.len(), "mounting fetch-backed modal");
        controller.mount();
        slot.controller = Some(controller.clone());
        Ok(controller)
    }
}

impl<P, M, T, V> ModalRenderer<M, V> for FetchRenderer<P, M, T, V>
where
    M: Modal,
    P: ModalVariant<M>,
    T: Clone + Send + Sync + 'static,
    V: 'static,
{
    fn render(&self, modal: &Arc<M>) -> Option<V> {
        let Some(payload) = P::narrow(modal) else {
            warn_variant_mismatch(P::TAG, modal.tag());
            return None;
        };

        let controller = match self.controller_for(modal, payload) {
            Ok(controller) => controller,
            Err(error) => {
                tracing::error!(target: targets::FETCH, %error, "cannot start fetches");
                return self.presenters.failed(&FetchError::new(error));
            }
        };

        let state = controller.state();
        let data = match state.phase() {
            FetchPhase::Failed(error) => return self.presenters.failed(error),
            FetchPhase::Loading => return self.presenters.loading(modal),
            FetchPhase::Ready(data) => data,
        };

        let update_all = RefreshAll::new(controller.clone());
        match &self.content {
            Content::Single(render) => {
                let Some(first) = data.first() else {
                    return self.presenters.loading(modal);
                };
                Some(render(SingleProps {
                    modal: payload,
                    data: first,
                    update: Refresh::new(controller.clone(), 0),
                    update_all,
                }))
            }
            Content::List(render) => {
                let update = (0..controller.len())
                    .map(|index| Refresh::new(controller.clone(), index))
                    .collect();
                Some(render(ListProps {
                    modal: payload,
                    data,
                    update,
                    update_all,
                }))
            }
        }
    }

    fn mount(&self, modal: &Arc<M>) {
        let mut slot = self.slot.lock();
        match slot.as_mut() {
            Some(current) if Arc::ptr_eq(&current.instance, modal) => current.outlets += 1,
            _ => {
                if let Some(stale) = slot.replace(Slot::new(modal, 1)) {
                    stale.teardown();
                }
            }
        }
    }

    fn unmount(&self, modal: &Arc<M>) {
        let mut slot = self.slot.lock();
        let Some(current) = slot.as_mut() else {
            return;
        };
        if !Arc::ptr_eq(&current.instance, modal) {
            return;
        }
        current.outlets = current.outlets.saturating_sub(1);
        if current.outlets == 0 {
            if let Some(released) = slot.take() {
                released.teardown();
            }
        }
    }

    fn reset(&self) {
        if let Some(released) = self.slot.lock().take() {
            released.teardown();
        }
    }
}

impl<P, M, T, V> fmt::Debug for FetchRenderer<P, M, T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRenderer")
            .field("list", &self.spec.is_list())
            .field("outlets", &self.slot.lock().as_ref().map_or(0, |slot| slot.outlets))
            .finish()
    }
}

//! The rendering outlet.
//!
//! An [`Outlet`] is what a host UI mounts once, wherever overlays should
//! appear. It follows the modal store, tracks which instance is mounted and
//! tells the host when to render again through its redraw signal.
//!
//! # Mounting
//!
//! Rendering is keyed by instance identity, not by tag. When the active
//! instance changes (a new `show`, a `go_back`, a `close_all`) the renderer of
//! the previous instance is unmounted before anything else happens, which for
//! fetch-backed modals tears down their controller so late results are
//! discarded. Showing two instances of the same tag in a row therefore mounts
//! twice and fetches twice.
//!
//! Several outlets of one system may be alive at once. Renderers see one
//! `mount` and one `unmount` per outlet, so a fetch-backed modal keeps its
//! controller until the last outlet showing it lets go.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use anymodal_core::logging::{span_names, targets};
use anymodal_core::{ConnectionGuard, ConnectionId, PerfSpan, Signal, Store};
use parking_lot::Mutex;

use crate::modal::Modal;
use crate::registry::{RendererRegistry, SharedRenderer};
use crate::state::ModalState;

struct Mounted<M, V> {
    modal: Arc<M>,
    renderer: SharedRenderer<M, V>,
}

struct OutletInner<M, V> {
    store: Arc<Store<ModalState<M>>>,
    registry: Arc<RendererRegistry<M, V>>,
    redraw: Arc<Signal<()>>,
    mounted: Mutex<Option<Mounted<M, V>>>,
    dirty: AtomicBool,
    warn_unregistered: bool,
}

impl<M: Modal, V> OutletInner<M, V> {
    /// Unmount if the mounted instance is no longer the active one.
    fn sync_active(&self) {
        let active = self.store.with(|state| state.active_modal.clone());
        let stale = {
            let mut mounted = self.mounted.lock();
            match (mounted.as_ref(), active.as_ref()) {
                (Some(current), Some(active)) if Arc::ptr_eq(&current.modal, active) => None,
                _ => mounted.take(),
            }
        };
        if let Some(stale) = stale {
            tracing::trace!(target: targets::OUTLET, tag = stale.modal.tag(), "unmounting");
            stale.renderer.unmount(&stale.modal);
        }
        self.dirty.store(true, Ordering::Release);
        self.redraw.emit(());
    }

    fn unmount_current(&self) {
        let previous = self.mounted.lock().take();
        if let Some(previous) = previous {
            previous.renderer.unmount(&previous.modal);
        }
    }

    fn mount(&self, modal: &Arc<M>, renderer: &SharedRenderer<M, V>) {
        let previous = {
            let mut mounted = self.mounted.lock();
            let unchanged = mounted.as_ref().is_some_and(|current| {
                Arc::ptr_eq(&current.modal, modal) && Arc::ptr_eq(&current.renderer, renderer)
            });
            if unchanged {
                return;
            }
            mounted.replace(Mounted {
                modal: modal.clone(),
                renderer: renderer.clone(),
            })
        };
        if let Some(previous) = previous {
            previous.renderer.unmount(&previous.modal);
        }
        renderer.mount(modal);
    }
}

/// Renders the active modal through the registry.
pub struct Outlet<M: Modal, V> {
    inner: Arc<OutletInner<M, V>>,
    _subscription: ConnectionGuard<()>,
}

impl<M: Modal, V: 'static> Outlet<M, V> {
    pub(crate) fn new(
        store: Arc<Store<ModalState<M>>>,
        registry: Arc<RendererRegistry<M, V>>,
        redraw: Arc<Signal<()>>,
        warn_unregistered: bool,
    ) -> Self {
        let inner = Arc::new(OutletInner {
            store: store.clone(),
            registry,
            redraw,
            mounted: Mutex::new(None),
            dirty: AtomicBool::new(true),
            warn_unregistered,
        });

        let weak: Weak<OutletInner<M, V>> = Arc::downgrade(&inner);
        let subscription = store.subscribe_scoped(move || {
            if let Some(inner) = weak.upgrade() {
                inner.sync_active();
            }
        });

        Self {
            inner,
            _subscription: subscription,
        }
    }

    /// Render the active modal.
    ///
    /// Returns `None` when nothing is open, when the active tag has no
    /// renderer (logging a warning), or when the renderer itself renders
    /// nothing.
    pub fn render(&self) -> Option<V> {
        let _span = PerfSpan::new(span_names::RENDER);
        self.inner.dirty.store(false, Ordering::Release);

        let Some(modal) = self.inner.store.with(|state| state.active_modal.clone()) else {
            self.inner.unmount_current();
            return None;
        };

        let Some(renderer) = self.inner.registry.get(modal.tag()) else {
            self.inner.unmount_current();
            if self.inner.warn_unregistered {
                tracing::warn!(
                    target: targets::OUTLET,
                    tag = modal.tag(),
                    "modal with type \"{}\" not found, make sure it's registered",
                    modal.tag()
                );
            }
            return None;
        };

        self.inner.mount(&modal, &renderer);
        renderer.render(&modal)
    }

    /// Call `slot` whenever the outlet should be rendered again.
    pub fn on_redraw<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.redraw.connect(move |_| slot())
    }

    /// Remove a slot added with [`on_redraw`](Self::on_redraw).
    pub fn disconnect_redraw(&self, id: ConnectionId) -> bool {
        self.inner.redraw.disconnect(id)
    }

    /// Whether a redraw was requested since the last [`render`](Self::render).
    ///
    /// Only stack changes set this flag; fetch progress is reported through
    /// the redraw signal alone.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::Acquire)
    }
}

impl<M: Modal, V> Drop for Outlet<M, V> {
    fn drop(&mut self) {
        self.inner.unmount_current();
    }
}

impl<M: Modal, V> fmt::Debug for Outlet<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mounted = self
            .inner
            .mounted
            .lock()
            .as_ref()
            .map(|current| current.modal.tag().to_owned());
        f.debug_struct("Outlet")
            .field("mounted", &mounted)
            .field("dirty", &self.inner.dirty.load(Ordering::Acquire))
            .finish()
    }
}

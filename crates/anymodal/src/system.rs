//! The modal system facade.
//!
//! [`ModalSystem`] ties one store, one stack controller and one renderer
//! registry together. Handles are cheap to clone and all refer to the same
//! system, so the stack operations can be handed to any part of the UI.
//!
//! # Example
//!
//! ```
//! use anymodal::{modal_variants, ModalSystem};
//!
//! #[derive(Debug)]
//! struct Profile { user_id: u64 }
//!
//! #[derive(Debug)]
//! enum AppModal { Profile(Profile) }
//!
//! modal_variants!(AppModal { Profile(Profile) => "profile" });
//!
//! let modals = ModalSystem::<AppModal, String>::new();
//! modals.create(|p: &Profile| format!("User ID: {}", p.user_id));
//!
//! let outlet = modals.outlet();
//! modals.show(AppModal::Profile(Profile { user_id: 123 }));
//! assert_eq!(outlet.render().as_deref(), Some("User ID: 123"));
//!
//! modals.close_all();
//! assert_eq!(outlet.render(), None);
//! ```

use std::fmt;
use std::sync::Arc;

use anymodal_core::{Signal, Store};
use tokio::runtime::Handle;

use crate::debug;
use crate::error::FetchError;
use crate::fetch::{Content, FetchPresenters, FetchRenderer, Fetcher, FetcherSpec, ListProps, SingleProps};
use crate::modal::{Modal, ModalVariant};
use crate::outlet::Outlet;
use crate::registry::RendererRegistry;
use crate::stack::ModalStack;
use crate::state::ModalState;

struct SystemInner<M, V> {
    stack: ModalStack<M>,
    registry: Arc<RendererRegistry<M, V>>,
    presenters: FetchPresenters<M, V>,
    warn_unregistered: bool,
}

/// A modal stack with its renderer registry.
pub struct ModalSystem<M, V> {
    inner: Arc<SystemInner<M, V>>,
}

impl<M: Modal, V: 'static> ModalSystem<M, V> {
    /// Create a system with no loader and no error renderer.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Configure a system before creating it.
    pub fn builder() -> ModalSystemBuilder<M, V> {
        ModalSystemBuilder::default()
    }

    /// Display `modal` on top of the current one.
    pub fn show(&self, modal: M) -> Arc<M> {
        self.inner.stack.show(modal)
    }

    /// Display a shared descriptor, keeping its identity.
    pub fn show_arc(&self, modal: Arc<M>) {
        self.inner.stack.show_arc(modal);
    }

    /// Return to the previous modal, or close if there is none.
    pub fn go_back(&self) {
        self.inner.stack.go_back();
    }

    /// Dismiss every modal.
    pub fn close_all(&self) {
        self.inner.stack.close_all();
    }

    /// Register a renderer for the payload type `P`.
    pub fn create<P, F>(&self, render: F)
    where
        P: ModalVariant<M>,
        F: Fn(&P) -> V + Send + Sync + 'static,
    {
        self.inner.registry.create(render);
    }

    /// Register a renderer over the whole descriptor under `tag`.
    pub fn create_raw<F>(&self, tag: impl Into<String>, render: F)
    where
        F: Fn(&M) -> V + Send + Sync + 'static,
    {
        self.inner.registry.create_raw(tag, render);
    }

    /// Register a renderer whose content needs one fetched value.
    ///
    /// Until the value arrives the loader is rendered; a failure renders the
    /// error renderer.
    pub fn create_with_fetch<P, T, F>(&self, fetcher: Fetcher<P, T>, render: F)
    where
        P: ModalVariant<M>,
        T: Clone + Send + Sync + 'static,
        F: Fn(SingleProps<'_, P, M, T>) -> V + Send + Sync + 'static,
    {
        self.register_fetch(FetcherSpec::Single(fetcher), Content::Single(Box::new(render)));
    }

    /// Register a renderer whose content needs several fetched values.
    ///
    /// Accepts a list or array of fetchers, or [`FetcherSpec::derived`] to
    /// pick them per instance.
    pub fn create_with_fetches<P, T, F>(&self, fetchers: impl Into<FetcherSpec<P, T>>, render: F)
    where
        P: ModalVariant<M>,
        T: Clone + Send + Sync + 'static,
        F: Fn(ListProps<'_, P, M, T>) -> V + Send + Sync + 'static,
    {
        self.register_fetch(fetchers.into(), Content::List(Box::new(render)));
    }

    fn register_fetch<P, T>(&self, spec: FetcherSpec<P, T>, content: Content<P, M, T, V>)
    where
        P: ModalVariant<M>,
        T: Clone + Send + Sync + 'static,
    {
        let renderer = FetchRenderer::new(spec, content, self.inner.presenters.clone());
        self.inner.registry.register(P::TAG, Arc::new(renderer));
    }

    /// Create an outlet rendering this system's active modal.
    pub fn outlet(&self) -> Outlet<M, V> {
        Outlet::new(
            self.inner.stack.store().clone(),
            self.inner.registry.clone(),
            self.inner.presenters.redraw.clone(),
            self.inner.warn_unregistered,
        )
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ModalState<M> {
        self.inner.stack.state()
    }

    /// The state store, for subscriptions.
    pub fn store(&self) -> &Arc<Store<ModalState<M>>> {
        self.inner.stack.store()
    }

    /// The stack controller.
    pub fn stack(&self) -> &ModalStack<M> {
        &self.inner.stack
    }

    /// The renderer registry.
    pub fn registry(&self) -> &Arc<RendererRegistry<M, V>> {
        &self.inner.registry
    }

    /// The stack as a tree, see [`debug::format_stack`].
    pub fn format_stack(&self) -> String {
        debug::format_stack(&self.state())
    }
}

impl<M: Modal, V: 'static> Default for ModalSystem<M, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, V> Clone for ModalSystem<M, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: Modal + fmt::Debug, V> fmt::Debug for ModalSystem<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalSystem")
            .field("state", &self.inner.stack.state())
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// Builder for [`ModalSystem`].
pub struct ModalSystemBuilder<M, V> {
    presenters: FetchPresenters<M, V>,
    warn_unregistered: bool,
}

impl<M: Modal, V: 'static> ModalSystemBuilder<M, V> {
    /// Render `loader` while a fetch-backed modal is loading.
    pub fn loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&M) -> V + Send + Sync + 'static,
    {
        self.presenters.loader = Some(Arc::new(move |modal: &M| Some(loader(modal))));
        self
    }

    /// Render `error` when a fetch-backed modal fails.
    pub fn error<F>(mut self, error: F) -> Self
    where
        F: Fn(&FetchError) -> V + Send + Sync + 'static,
    {
        self.presenters.error = Some(Arc::new(move |err: &FetchError| Some(error(err))));
        self
    }

    /// Run fetches on `handle`.
    ///
    /// Without one, fetches run on the runtime current at first mount, or on
    /// the global [`AsyncRuntime`](anymodal_core::AsyncRuntime) outside any
    /// runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.presenters.runtime = Some(handle);
        self
    }

    /// Whether the outlet warns about unregistered tags. On by default.
    pub fn warn_unregistered(mut self, warn: bool) -> Self {
        self.warn_unregistered = warn;
        self
    }

    /// Create the system.
    pub fn build(self) -> ModalSystem<M, V> {
        anymodal_core::modal_debug!(
            loader = self.presenters.loader.is_some(),
            error = self.presenters.error.is_some(),
            runtime = self.presenters.runtime.is_some(),
            "modal system created"
        );
        ModalSystem {
            inner: Arc::new(SystemInner {
                stack: ModalStack::new(),
                registry: Arc::new(RendererRegistry::new()),
                presenters: self.presenters,
                warn_unregistered: self.warn_unregistered,
            }),
        }
    }
}

impl<M, V> Default for ModalSystemBuilder<M, V> {
    fn default() -> Self {
        Self {
            presenters: FetchPresenters {
                loader: None,
                error: None,
                runtime: None,
                redraw: Arc::new(Signal::new()),
            },
            warn_unregistered: true,
        }
    }
}

impl<M, V> fmt::Debug for ModalSystemBuilder<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalSystemBuilder")
            .field("loader", &self.presenters.loader.is_some())
            .field("error", &self.presenters.error.is_some())
            .field("runtime", &self.presenters.runtime.is_some())
            .field("warn_unregistered", &self.warn_unregistered)
            .finish()
    }
}

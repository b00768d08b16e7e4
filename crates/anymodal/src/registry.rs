//! Renderer registry.
//!
//! Renderers are stored type-erased behind [`ModalRenderer`], keyed by tag.
//! Typed registration goes through a [`ModalVariant`], so a renderer written
//! for `Profile` only ever sees a `&Profile`; the narrowing happens once per
//! render, inside the stored renderer.
//!
//! Lookups that miss are not errors. The outlet turns them into a warning.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use anymodal_core::logging::targets;
use parking_lot::RwLock;

use crate::modal::{Modal, ModalVariant};

/// A renderer for modals of the union `M`, producing views of type `V`.
pub trait ModalRenderer<M, V>: Send + Sync {
    /// Render `modal`. `None` renders nothing.
    fn render(&self, modal: &Arc<M>) -> Option<V>;

    /// An outlet started showing `modal` through this renderer.
    fn mount(&self, _modal: &Arc<M>) {}

    /// An outlet stopped showing `modal`. Outlets pair every `unmount` with an
    /// earlier [`mount`](Self::mount) of the same instance.
    fn unmount(&self, _modal: &Arc<M>) {}

    /// The renderer left the registry. Drop any per-instance state.
    fn reset(&self) {}
}

/// Shared handle to a stored renderer.
pub type SharedRenderer<M, V> = Arc<dyn ModalRenderer<M, V>>;

/// Renders a narrowed payload with a plain function.
pub(crate) struct VariantRenderer<P, F> {
    render: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> VariantRenderer<P, F> {
    pub(crate) fn new(render: F) -> Self {
        Self {
            render,
            _payload: PhantomData,
        }
    }
}

impl<M, V, P, F> ModalRenderer<M, V> for VariantRenderer<P, F>
where
    M: Modal,
    P: ModalVariant<M>,
    F: Fn(&P) -> V + Send + Sync,
{
    fn render(&self, modal: &Arc<M>) -> Option<V> {
        match P::narrow(modal) {
            Some(payload) => Some((self.render)(payload)),
            None => {
                warn_variant_mismatch(P::TAG, modal.tag());
                None
            }
        }
    }
}

/// Renders the whole descriptor, for untyped registrations.
pub(crate) struct RawRenderer<F> {
    render: F,
}

impl<F> RawRenderer<F> {
    pub(crate) fn new(render: F) -> Self {
        Self { render }
    }
}

impl<M, V, F> ModalRenderer<M, V> for RawRenderer<F>
where
    F: Fn(&M) -> V + Send + Sync,
{
    fn render(&self, modal: &Arc<M>) -> Option<V> {
        Some((self.render)(modal))
    }
}

pub(crate) fn warn_variant_mismatch(expected: &str, actual: &str) {
    tracing::warn!(
        target: targets::REGISTRY,
        expected,
        actual,
        "renderer registered for a different modal variant"
    );
}

/// Mapping from tag to renderer. Last registration for a tag wins.
pub struct RendererRegistry<M, V> {
    renderers: RwLock<HashMap<String, SharedRenderer<M, V>>>,
}

impl<M, V> RendererRegistry<M, V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            renderers: RwLock::new(HashMap::new()),
        }
    }

    /// Store `renderer` under `tag`, replacing any earlier registration.
    ///
    /// The replaced renderer, if any, is returned after being reset.
    pub fn register(
        &self,
        tag: impl Into<String>,
        renderer: SharedRenderer<M, V>,
    ) -> Option<SharedRenderer<M, V>> {
        let tag = tag.into();
        let previous = self.renderers.write().insert(tag.clone(), renderer);
        if let Some(previous) = &previous {
            previous.reset();
            tracing::debug!(target: targets::REGISTRY, %tag, "renderer replaced");
        } else {
            tracing::debug!(target: targets::REGISTRY, %tag, "renderer registered");
        }
        previous
    }

    /// Look up the renderer for `tag`.
    pub fn get(&self, tag: &str) -> Option<SharedRenderer<M, V>> {
        self.renderers.read().get(tag).cloned()
    }

    /// Whether `tag` has a renderer.
    pub fn contains(&self, tag: &str) -> bool {
        self.renderers.read().contains_key(tag)
    }

    /// Remove and reset the renderer for `tag`.
    pub fn remove(&self, tag: &str) -> Option<SharedRenderer<M, V>> {
        let removed = self.renderers.write().remove(tag);
        if let Some(renderer) = &removed {
            renderer.reset();
        }
        removed
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.renderers.read().len()
    }

    /// Whether no renderer is registered.
    pub fn is_empty(&self) -> bool {
        self.renderers.read().is_empty()
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.renderers.read().keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl<M: Modal, V: 'static> RendererRegistry<M, V> {
    /// Register a plain renderer for the payload type `P`.
    pub fn create<P, F>(&self, render: F)
    where
        P: ModalVariant<M>,
        F: Fn(&P) -> V + Send + Sync + 'static,
    {
        self.register(P::TAG, Arc::new(VariantRenderer::<P, F>::new(render)));
    }

    /// Register a renderer over the whole descriptor under an explicit tag.
    pub fn create_raw<F>(&self, tag: impl Into<String>, render: F)
    where
        F: Fn(&M) -> V + Send + Sync + 'static,
    {
        self.register(tag, Arc::new(RawRenderer::new(render)));
    }
}

impl<M, V> Default for RendererRegistry<M, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, V> std::fmt::Debug for RendererRegistry<M, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

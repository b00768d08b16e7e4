//! A reactive modal stack with tag-keyed renderers and async data loading.
//!
//! anymodal keeps one active modal and a back-stack of earlier ones in an
//! observable store. Modals are plain tagged values; renderers are registered
//! per tag and looked up by an [`Outlet`] whenever the host UI redraws.
//!
//! # Overview
//!
//! - **Descriptors**: any type implementing [`Modal`]. The [`modal_variants!`]
//!   macro implements it for an enum of newtype variants and makes each
//!   payload a [`ModalVariant`], so renderers receive the narrowed payload.
//! - **Stack**: [`ModalSystem::show`], [`go_back`](ModalSystem::go_back) and
//!   [`close_all`](ModalSystem::close_all) are single atomic updates of the
//!   [`ModalState`] store.
//! - **Registry**: [`ModalSystem::create`] registers a plain renderer;
//!   [`create_with_fetch`](ModalSystem::create_with_fetch) and
//!   [`create_with_fetches`](ModalSystem::create_with_fetches) register one
//!   that loads data first.
//! - **Outlet**: renders the active modal, unmounts renderers when the active
//!   instance changes and warns once per render about unregistered tags.
//!
//! # Fetch-backed modals
//!
//! ```
//! use anymodal::{modal_variants, FetchError, Fetcher, ModalSystem};
//!
//! #[derive(Debug)]
//! struct ViewPost { post_id: u64 }
//!
//! #[derive(Debug)]
//! enum AppModal { ViewPost(ViewPost) }
//!
//! modal_variants!(AppModal { ViewPost(ViewPost) => "view-post" });
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let modals = ModalSystem::<AppModal, String>::builder()
//!     .loader(|_| "Loading...".to_string())
//!     .error(|err| format!("Error: {err}"))
//!     .build();
//!
//! modals.create_with_fetch(
//!     Fetcher::new(|post: &ViewPost| {
//!         let id = post.post_id;
//!         async move { Ok::<_, FetchError>(format!("Post {id}")) }
//!     }),
//!     |props| format!("{} (#{})", props.data, props.modal.post_id),
//! );
//!
//! let outlet = modals.outlet();
//! modals.show(AppModal::ViewPost(ViewPost { post_id: 9 }));
//! assert_eq!(outlet.render().as_deref(), Some("Loading..."));
//! # }
//! ```
//!
//! Fetch progress is reported through [`Outlet::on_redraw`]; the host renders
//! again when it fires.

pub mod debug;
pub mod error;
pub mod fetch;
pub mod modal;
pub mod outlet;
pub mod registry;
pub mod stack;
pub mod state;
pub mod system;

pub use error::{FetchError, ModalError, Result};
pub use fetch::{
    FetchController, FetchFuture, FetchPhase, FetchState, Fetcher, FetcherSpec, ListProps,
    Refresh, RefreshAll, SingleProps,
};
pub use modal::{Modal, ModalVariant};
pub use outlet::Outlet;
pub use registry::{ModalRenderer, RendererRegistry, SharedRenderer};
pub use stack::ModalStack;
pub use state::ModalState;
pub use system::{ModalSystem, ModalSystemBuilder};

pub use anymodal_core::{AsyncRuntime, AsyncRuntimeConfig, ConnectionId};

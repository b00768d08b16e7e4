//! Modal descriptors and tag narrowing.
//!
//! A modal descriptor is any value that can report its discriminant tag. The
//! usual shape is a caller-defined enum with one newtype variant per tag:
//!
//! ```
//! use anymodal::modal_variants;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct Profile {
//!     pub user_id: u64,
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct ViewPost {
//!     pub post_id: u64,
//!     pub author_id: u64,
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub enum AppModal {
//!     Profile(Profile),
//!     ViewPost(ViewPost),
//! }
//!
//! modal_variants!(AppModal {
//!     Profile(Profile) => "profile",
//!     ViewPost(ViewPost) => "view-post",
//! });
//!
//! use anymodal::{Modal, ModalVariant};
//! let modal = AppModal::Profile(Profile { user_id: 7 });
//! assert_eq!(modal.tag(), "profile");
//! assert_eq!(Profile::narrow(&modal).map(|p| p.user_id), Some(7));
//! assert!(ViewPost::narrow(&modal).is_none());
//! ```

/// A modal descriptor: a tagged value the library only inspects for its tag.
pub trait Modal: Send + Sync + 'static {
    /// The discriminant tag used for renderer lookup.
    fn tag(&self) -> &str;
}

/// A payload type that one tag of the modal union `M` narrows to.
///
/// Registering a renderer for `P` stores it under `P::TAG`; at render time the
/// registry narrows the active `M` back to `&P`.
pub trait ModalVariant<M: Modal>: Send + Sync + 'static {
    /// The tag this payload is registered under.
    const TAG: &'static str;

    /// Borrow the payload if `modal` is this variant.
    fn narrow(modal: &M) -> Option<&Self>;
}

/// Implement [`Modal`] for an enum of newtype variants and [`ModalVariant`]
/// for each payload type.
#[macro_export]
macro_rules! modal_variants {
    ($modal:ident { $($variant:ident($payload:ty) => $tag:literal),+ $(,)? }) => {
        impl $crate::Modal for $modal {
            fn tag(&self) -> &str {
                match self {
                    $( $modal::$variant(_) => $tag, )+
                }
            }
        }

        $(
            impl $crate::ModalVariant<$modal> for $payload {
                const TAG: &'static str = $tag;

                fn narrow(modal: &$modal) -> ::core::option::Option<&Self> {
                    #[allow(unreachable_patterns)]
                    match modal {
                        $modal::$variant(payload) => ::core::option::Option::Some(payload),
                        _ => ::core::option::Option::None,
                    }
                }
            }
        )+
    };
}

/// JSON descriptors carry their tag in a string `"type"` field.
///
/// A value without one has the empty tag, which is never registered unless
/// the caller registers `""` explicitly.
#[cfg(feature = "json")]
impl Modal for serde_json::Value {
    fn tag(&self) -> &str {
        self.get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }
}

//! Error types for the modal system.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use anymodal_core::AsyncRuntimeError;
use thiserror::Error;

/// Errors returned by modal system operations.
///
/// Rendering never fails: a missing renderer or a failed fetch is reported
/// through logging and the fetch state instead.
#[derive(Error, Debug)]
pub enum ModalError {
    /// A refresh was requested for a fetcher that does not exist.
    #[error("fetcher index {index} out of range for {len} fetchers")]
    FetcherIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The number of fetchers of the mounted modal.
        len: usize,
    },

    /// The fetch controller was torn down before the operation ran.
    #[error("fetch controller has been torn down")]
    TornDown,

    /// No async runtime could be found or created for fetch-backed modals.
    #[error("async runtime unavailable: {0}")]
    Runtime(#[from] AsyncRuntimeError),
}

/// Result type for modal system operations.
pub type Result<T> = std::result::Result<T, ModalError>;

/// The error produced by a failed fetcher.
///
/// Cheap to clone, so it can live inside snapshotted fetch state. Any
/// `std::error::Error + Send + Sync + 'static` converts into it with `?`.
#[derive(Clone)]
pub struct FetchError {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl FetchError {
    /// Wrap an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(MessageError(message.into()))
    }

    /// Borrow the underlying error.
    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// Attempt to downcast to a concrete error type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Whether two handles refer to the same error value.
    pub fn ptr_eq(&self, other: &FetchError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E> From<E> for FetchError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchError").field(&self.inner).finish()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

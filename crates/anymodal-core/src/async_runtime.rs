//! Async runtime integration for anymodal.
//!
//! Fetch-backed modals run their fetchers on a Tokio runtime. This module
//! owns the runtime used when the host application does not provide one, and
//! the [`AsyncCancellationToken`] used as a mount guard: once a modal instance
//! is torn down its token is cancelled, and late fetch completions check it
//! before writing state.
//!
//! The owned runtime is a current-thread Tokio runtime driven by one
//! dedicated thread. Futures interleave but never run in parallel, which is
//! the cooperative model UI toolkits expect. Hosts that already run Tokio hand
//! their own `Handle` to the modal system instead.
//!
//! # Example: Spawning an Async Task
//!
//! ```no_run
//! use anymodal_core::async_runtime::{AsyncRuntime, AsyncRuntimeConfig};
//!
//! # async fn fetch_data() -> String { "data".to_string() }
//! let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default()).unwrap();
//! let handle = runtime.spawn(async { fetch_data().await });
//! let result = handle.blocking_wait();
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;

use crate::logging::targets;

/// Global async runtime instance.
static GLOBAL_RUNTIME: OnceLock<AsyncRuntime> = OnceLock::new();

/// Counter for unique task IDs.
static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the async runtime.
#[derive(Debug, Clone)]
pub struct AsyncRuntimeConfig {
    /// Name prefix for the runtime thread.
    pub thread_name: String,
    /// Enable time driver (required for tokio::time operations).
    pub enable_time: bool,
}

impl Default for AsyncRuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "anymodal-fetch".to_string(),
            enable_time: true,
        }
    }
}

/// A handle to a spawned async task.
///
/// Dropping the handle does not abort the task.
#[derive(Debug)]
pub struct AsyncTaskHandle<T> {
    id: u64,
    receiver: oneshot::Receiver<T>,
}

impl<T> AsyncTaskHandle<T> {
    /// Get the unique task ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the task to complete, blocking the current thread.
    ///
    /// Returns `None` if the task panicked or the runtime shut down first.
    ///
    /// # Warning
    ///
    /// Do not call this from within an async context; it will panic.
    pub fn blocking_wait(self) -> Option<T> {
        self.receiver.blocking_recv().ok()
    }

    /// Await the task result.
    pub async fn wait(self) -> Option<T> {
        self.receiver.await.ok()
    }
}

/// Spawn `future` on `handle`, returning a handle to its result.
pub fn spawn_on<F, T>(handle: &Handle, future: F) -> AsyncTaskHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
    let (sender, receiver) = oneshot::channel();

    handle.spawn(async move {
        let result = future.await;
        let _ = sender.send(result);
    });

    AsyncTaskHandle { id, receiver }
}

/// A cancellation token for async tasks.
///
/// Cloning shares the underlying flag. Holders poll it with
/// [`is_cancelled`](Self::is_cancelled).
#[derive(Debug, Clone)]
pub struct AsyncCancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl AsyncCancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation.
    ///
    /// Returns `true` if this call performed the cancellation.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::AcqRel)
    }
}

impl Default for AsyncCancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The async runtime manager.
///
/// Dropping it stops the runtime thread once the thread is idle.
pub struct AsyncRuntime {
    handle: Handle,
    thread_name: String,
    _shutdown: oneshot::Sender<()>,
}

impl AsyncRuntime {
    /// Get the global async runtime, creating it with default settings on
    /// first use.
    pub fn global() -> Result<&'static AsyncRuntime, AsyncRuntimeError> {
        if let Some(runtime) = GLOBAL_RUNTIME.get() {
            return Ok(runtime);
        }
        let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default())?;
        // Losing the race is fine; the winner's runtime is used.
        let _ = GLOBAL_RUNTIME.set(runtime);
        GLOBAL_RUNTIME
            .get()
            .ok_or_else(|| AsyncRuntimeError::CreationFailed("global runtime unavailable".into()))
    }

    /// Start a runtime on a new thread named `{thread_name}-main`.
    pub fn new(config: AsyncRuntimeConfig) -> Result<Self, AsyncRuntimeError> {
        let AsyncRuntimeConfig {
            thread_name,
            enable_time,
        } = config;
        let thread_name = format!("{thread_name}-main");

        let (handle_tx, handle_rx) = std::sync::mpsc::channel::<Result<Handle, String>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let mut builder = Builder::new_current_thread();
                if enable_time {
                    builder.enable_time();
                }

                let runtime = match builder.build() {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = handle_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = handle_tx.send(Ok(runtime.handle().clone()));

                // Resolves when the owning `AsyncRuntime` drops its sender.
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
            })
            .map_err(|e| AsyncRuntimeError::CreationFailed(e.to_string()))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| AsyncRuntimeError::CreationFailed("runtime thread exited early".into()))?
            .map_err(AsyncRuntimeError::CreationFailed)?;

        tracing::debug!(target: targets::RUNTIME, %thread_name, "fetch runtime started");

        Ok(Self {
            handle,
            thread_name,
            _shutdown: shutdown_tx,
        })
    }

    /// Get a handle to the Tokio runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn an async task on the runtime.
    pub fn spawn<F, T>(&self, future: F) -> AsyncTaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        spawn_on(&self.handle, future)
    }
}

impl std::fmt::Debug for AsyncRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncRuntime")
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur with the async runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncRuntimeError {
    /// Failed to create the runtime.
    CreationFailed(String),
}

impl std::fmt::Display for AsyncRuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreationFailed(msg) => write!(f, "Failed to create async runtime: {}", msg),
        }
    }
}

impl std::error::Error for AsyncRuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::time::Duration;

    #[test]
    fn test_spawn_and_wait() {
        let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default()).unwrap();
        let handle = runtime.spawn(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            "hello"
        });
        assert_eq!(handle.blocking_wait(), Some("hello"));
    }

    #[test]
    fn test_runtime_thread_name() {
        let runtime = AsyncRuntime::new(AsyncRuntimeConfig {
            thread_name: "modal-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        let name = runtime
            .spawn(async { std::thread::current().name().map(str::to_owned) })
            .blocking_wait();
        assert_eq!(name, Some(Some("modal-test-main".to_string())));
    }

    #[test]
    fn test_multiple_tasks() {
        let runtime = AsyncRuntime::new(AsyncRuntimeConfig::default()).unwrap();
        let counter = Arc::new(AtomicI32::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let counter = counter.clone();
                runtime.spawn(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.blocking_wait();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_global_runtime_is_shared() {
        let first = AsyncRuntime::global().unwrap();
        let second = AsyncRuntime::global().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.spawn(async { 3 }).blocking_wait(), Some(3));
    }

    #[test]
    fn test_cancellation_token() {
        let token = AsyncCancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        assert!(token.cancel());
        assert!(!token.cancel());
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn test_spawn_on_current_handle() {
        let handle = spawn_on(&Handle::current(), async { 7 });
        assert_eq!(handle.wait().await, Some(7));
    }
}

//! Logging facilities for anymodal.
//!
//! anymodal uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("anymodal=debug,anymodal_core=info")
//!         .init();
//! }
//! ```
//!
//! The one message every application should see is the warning emitted by
//! the outlet when the active modal's tag has no registered renderer. It is
//! logged at `warn` level under [`targets::OUTLET`].

/// Span names used throughout anymodal for tracing.
pub mod span_names {
    /// Outlet render span.
    pub const RENDER: &str = "anymodal::render";
    /// Fetch batch span.
    pub const FETCH: &str = "anymodal::fetch";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "anymodal_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "anymodal_core::signal";
    /// Observable store target.
    pub const STORE: &str = "anymodal_core::store";
    /// Async runtime target.
    pub const RUNTIME: &str = "anymodal_core::runtime";
    /// Modal stack controller target.
    pub const STACK: &str = "anymodal::stack";
    /// Renderer registry target.
    pub const REGISTRY: &str = "anymodal::registry";
    /// Fetch orchestrator target.
    pub const FETCH: &str = "anymodal::fetch";
    /// Outlet target.
    pub const OUTLET: &str = "anymodal::outlet";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of an operation.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "anymodal::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// `tracing::debug!` under the core target.
#[macro_export]
macro_rules! modal_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "anymodal_core", $($arg)*)
    };
}

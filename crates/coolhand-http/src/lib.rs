//! Coolhand HTTP - instrumented transports that capture LLM API calls.
//!
//! Wrap an HTTP client in [`Instrumented`] and, while instrumentation is
//! enabled, every call it makes to a known LLM provider is snapshotted and
//! handed to the registered capture handler. Calls to local destinations and
//! to any other host pass through untouched.
//!
//! ## Features
//!
//! - Sync ([`Transport`]) and async ([`AsyncTransport`]) clients
//! - Idempotent enable/disable on a process-wide [`Instrumentation`]
//! - Streaming responses recorded as a placeholder, never consumed
//! - Transport errors returned to the caller unchanged
//! - Adapters for `reqwest` (feature `reqwest`) and `http` types
//!
//! ## Architecture
//!
//! ```text
//! Caller → Instrumented<T>::send → enabled?
//!                                    │
//!                  ┌─────────────────┴─────────────────┐
//!                  │ No                                │ Yes
//!                  ▼                                   ▼
//!              T::send                          Provider, not local?
//!                                                      │
//!                                     ┌────────────────┴────────────────┐
//!                                     │ No                              │ Yes
//!                                     ▼                                 ▼
//!                                 T::send                     Snapshot → T::send
//!                                                                       │
//!                                                                       ▼
//!                                                             CaptureEvent → handler
//! ```

mod capture;
mod client;
mod error;
pub mod instrument;
mod reader;
#[cfg(feature = "reqwest")]
pub mod reqwest_transport;
pub mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use capture::{capture_async, capture_sync, snapshot_request};
pub use client::Instrumented;
pub use error::{CaptureError, Result};
pub use instrument::{Instrumentation, PatchState};
pub use reader::{is_streaming_response, read_response_body, read_response_body_async};
#[cfg(feature = "reqwest")]
pub use reqwest_transport::{BlockingResponse, ReqwestResponse, ResponseBody};
pub use transport::{headers_from_map, AsyncTransport, InboundResponse, OutboundRequest, Transport};

use coolhand_core::{CaptureEvent, CaptureHandler};

/// Returns the process-wide instrumentation.
pub fn instrumentation() -> Arc<Instrumentation> {
    Instrumentation::global()
}

/// Wraps a transport, bound to the process-wide instrumentation.
pub fn instrument<T>(inner: T) -> Instrumented<T> {
    Instrumented::new(inner)
}

/// Registers the process-wide capture handler, replacing any previous one.
pub fn set_handler<F>(handler: F)
where
    F: Fn(CaptureEvent) + Send + Sync + 'static,
{
    Instrumentation::global().set_handler(handler);
}

/// Returns the process-wide capture handler.
pub fn get_handler() -> Option<CaptureHandler> {
    Instrumentation::global().handler()
}

/// Removes the process-wide capture handler.
pub fn clear_handler() {
    Instrumentation::global().clear_handler();
}

/// Enables process-wide capture. Idempotent.
pub fn enable() -> bool {
    Instrumentation::global().enable()
}

/// Disables process-wide capture. Idempotent.
pub fn disable() {
    Instrumentation::global().disable();
}

/// Returns whether process-wide capture is enabled.
pub fn is_enabled() -> bool {
    Instrumentation::global().is_enabled()
}

/// Same as [`is_enabled`].
pub fn status() -> bool {
    Instrumentation::global().status()
}

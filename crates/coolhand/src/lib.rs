//! Coolhand - capture outgoing LLM API calls.
//!
//! Wrap the HTTP client you already use and every call it makes to a known
//! LLM provider is recorded as a [`CaptureEvent`] and handed to your
//! handler. Local endpoints and other hosts are never captured, streaming
//! bodies are never consumed, and the client's own results and errors come
//! back unchanged.
//!
//! ## Quick start
//!
//! ```no_run
//! use coolhand::{Config, Monitor};
//!
//! let monitor = Monitor::new(Config::default());
//! monitor.start(|event| {
//!     println!("{} {}", event.request().method, event.request().url);
//! });
//!
//! // Wrap a transport, e.g. `reqwest::Client`:
//! // let client = monitor.instrument(reqwest::Client::new());
//!
//! monitor.stop();
//! ```
//!
//! The lower-level lifecycle is available as free functions over the
//! process-wide [`Instrumentation`]: [`set_handler`], [`enable`],
//! [`disable`], [`status`].

pub mod logging;
mod monitor;

pub use coolhand_core::{
    host_of, is_known_provider, is_local, is_of_interest, is_streaming_content_type,
    provider_name, Body, CaptureEvent, CaptureHandler, Config, ConfigError, Headers,
    RequestSnapshot, ResponseSnapshot, PROVIDERS, STREAMING_CONTENT_TYPES,
    STREAMING_PLACEHOLDER,
};
pub use coolhand_http::{
    clear_handler, disable, enable, get_handler, instrument, instrumentation, is_enabled,
    set_handler, status, AsyncTransport, InboundResponse, Instrumentation, Instrumented,
    OutboundRequest, PatchState, Transport,
};
#[cfg(feature = "reqwest")]
pub use coolhand_http::{BlockingResponse, ReqwestResponse, ResponseBody};
pub use monitor::{Monitor, MonitorStats};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

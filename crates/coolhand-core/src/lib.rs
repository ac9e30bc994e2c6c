//! Coolhand Core - classification, capture snapshots, and event delivery.
//!
//! This crate holds the pieces of the capture pipeline that do not depend on
//! any particular HTTP client:
//!
//! - [`classifier`]: decides whether a destination is local, whether it is a
//!   known LLM provider, and whether a content type is streaming
//! - [`providers`]: the fixed list of provider API hosts
//! - [`snapshot`]: request/response snapshots and the [`CaptureEvent`] tuple
//! - [`handler`]: the single-slot registry that receives capture events
//! - [`config`]: runtime settings shared by the outer crates

pub mod classifier;
pub mod config;
mod error;
pub mod handler;
pub mod providers;
pub mod snapshot;

pub use classifier::{
    host_of, is_known_provider, is_local, is_of_interest, is_streaming_content_type,
    STREAMING_CONTENT_TYPES,
};
pub use config::Config;
pub use error::{ConfigError, Result};
pub use handler::{CaptureHandler, HandlerRegistry};
pub use providers::{provider_for_host, provider_name, ProviderEntry, PROVIDERS};
pub use snapshot::{
    Body, CaptureEvent, Headers, RequestSnapshot, ResponseSnapshot, STREAMING_PLACEHOLDER,
};

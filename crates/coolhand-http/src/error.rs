//! Error types for the capture path.
//!
//! These never reach the caller of an intercepted request: every
//! `CaptureError` degrades the snapshot being built and is logged instead.

use thiserror::Error;

/// Capture construction error.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The client keeps no readable copy of the body.
    #[error("response body is not readable without consuming it")]
    BodyUnavailable,

    /// Reading the body failed.
    #[error("failed to read body: {0}")]
    BodyRead(String),
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

//! Response body extraction.
//!
//! Streaming bodies are never read: they may be unbounded or still open, and
//! the caller owns them. For everything else the cached body wins over a
//! fresh read, since some clients can only read a body once.

use coolhand_core::{is_streaming_content_type, Body};

use crate::transport::InboundResponse;

/// Returns true if the response declares a streaming content type.
pub fn is_streaming_response<R: InboundResponse + ?Sized>(response: &R) -> bool {
    response
        .content_type()
        .map(|ct| is_streaming_content_type(&ct))
        .unwrap_or(false)
}

/// Extracts a body snapshot from a response.
///
/// Returns the streaming placeholder for streaming responses and `None` when
/// no body could be obtained.
pub fn read_response_body<R: InboundResponse + ?Sized>(response: &R) -> Option<Body> {
    if is_streaming_response(response) {
        return Some(Body::streaming_placeholder());
    }
    read_buffered(response)
}

/// Async form of [`read_response_body`].
pub async fn read_response_body_async<R: InboundResponse + ?Sized>(response: &R) -> Option<Body> {
    if is_streaming_response(response) {
        return Some(Body::streaming_placeholder());
    }
    if let Some(bytes) = response.cached_body() {
        return Some(Body::Bytes(bytes));
    }
    match response.read_body_async().await {
        Ok(bytes) => Some(Body::Bytes(bytes)),
        Err(e) => {
            tracing::debug!("Response body not captured: {}", e);
            None
        }
    }
}

fn read_buffered<R: InboundResponse + ?Sized>(response: &R) -> Option<Body> {
    if let Some(bytes) = response.cached_body() {
        return Some(Body::Bytes(bytes));
    }
    match response.read_body() {
        Ok(bytes) => Some(Body::Bytes(bytes)),
        Err(e) => {
            tracing::debug!("Response body not captured: {}", e);
            None
        }
    }
}

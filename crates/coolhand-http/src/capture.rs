//! Capture pipeline.
//!
//! ```text
//! request → is_of_interest? ──no──→ inner send, no event
//!                │yes
//!                ▼
//!         RequestSnapshot
//!                │
//!          inner send ──Err──→ event(request, error) → same Err
//!                │Ok
//!                ▼
//!        ResponseSnapshot (placeholder body if streaming)
//!                │
//!          event(request, response) → same Ok
//! ```
//!
//! The sync and async entry points differ only in where they suspend. The
//! handler always runs before the caller gets its result back.

use std::time::Instant;

use chrono::Utc;

use coolhand_core::{
    is_of_interest, CaptureEvent, HandlerRegistry, RequestSnapshot, ResponseSnapshot,
};

use crate::reader::{is_streaming_response, read_response_body, read_response_body_async};
use crate::transport::{AsyncTransport, InboundResponse, OutboundRequest, Transport};

/// Takes a snapshot of an outgoing request.
pub fn snapshot_request<R: OutboundRequest + ?Sized>(request: &R) -> RequestSnapshot {
    RequestSnapshot::new(request.method(), request.url(), request.headers(), request.body())
}

/// Sends a request through `transport`, capturing it if it is of interest.
pub fn capture_sync<T: Transport + ?Sized>(
    handlers: &HandlerRegistry,
    transport: &T,
    request: T::Request,
) -> Result<T::Response, T::Error> {
    let url = request.url();
    if !is_of_interest(&url) {
        return transport.send(request);
    }

    let snapshot = snapshot_request(&request);
    let started = Instant::now();

    match transport.send(request) {
        Ok(response) => {
            let duration = started.elapsed();
            let timestamp = Utc::now();
            let response_snapshot = ResponseSnapshot {
                status_code: response.status(),
                headers: response.headers(),
                body: read_response_body(&response),
                timestamp,
                duration,
                is_streaming: is_streaming_response(&response),
            };
            deliver(handlers, CaptureEvent::completed(snapshot, response_snapshot));
            Ok(response)
        }
        Err(err) => {
            deliver(handlers, CaptureEvent::failed(snapshot, err.to_string()));
            Err(err)
        }
    }
}

/// Async form of [`capture_sync`].
///
/// If the returned future is dropped before the inner call completes, no
/// event is produced.
pub async fn capture_async<T: AsyncTransport + ?Sized>(
    handlers: &HandlerRegistry,
    transport: &T,
    request: T::Request,
) -> Result<T::Response, T::Error> {
    let url = request.url();
    if !is_of_interest(&url) {
        return transport.send(request).await;
    }

    let snapshot = snapshot_request(&request);
    let started = Instant::now();

    let mut in_flight = InFlight::new(&url);
    let result = transport.send(request).await;
    in_flight.finish();

    match result {
        Ok(response) => {
            let duration = started.elapsed();
            let timestamp = Utc::now();
            let is_streaming = is_streaming_response(&response);
            let body = read_response_body_async(&response).await;
            let response_snapshot = ResponseSnapshot {
                status_code: response.status(),
                headers: response.headers(),
                body,
                timestamp,
                duration,
                is_streaming,
            };
            deliver(handlers, CaptureEvent::completed(snapshot, response_snapshot));
            Ok(response)
        }
        Err(err) => {
            deliver(handlers, CaptureEvent::failed(snapshot, err.to_string()));
            Err(err)
        }
    }
}

fn deliver(handlers: &HandlerRegistry, event: CaptureEvent) {
    tracing::debug!(
        method = %event.request().method,
        url = %event.request().url,
        status = event.response().map(|r| r.status_code),
        error = event.error(),
        "Captured LLM API call"
    );
    handlers.dispatch(event);
}

/// Notes a cancelled call when dropped before [`finish`](Self::finish).
struct InFlight<'a> {
    url: &'a str,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn new(url: &'a str) -> Self {
        Self {
            url,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(url = %self.url, "Call cancelled before completion; nothing captured");
        }
    }
}

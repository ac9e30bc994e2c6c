//! Instrumented transport handle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::capture::{capture_async, capture_sync};
use crate::instrument::Instrumentation;
use crate::transport::{AsyncTransport, Transport};

tokio::task_local! {
    /// Set while a call is inside a capture pipeline.
    static CAPTURING: bool;
}

/// Returns true when the current call is already being captured by an outer
/// [`Instrumented`] layer.
fn capturing() -> bool {
    CAPTURING.try_with(|active| *active).unwrap_or(false)
}

/// A transport whose calls are captured while instrumentation is enabled.
///
/// The inner transport is held unchanged. When instrumentation is disabled,
/// calls go straight to it with no snapshot taken.
///
/// Wrapping an already instrumented transport still yields one event per
/// call: the outermost enabled layer captures and inner layers pass through.
/// Calls made by a capture handler itself are not captured.
#[derive(Debug, Clone)]
pub struct Instrumented<T> {
    inner: T,
    instrumentation: Arc<Instrumentation>,
}

impl<T> Instrumented<T> {
    /// Wraps a transport, bound to the process-wide instrumentation.
    pub fn new(inner: T) -> Self {
        Self::with_instrumentation(inner, Instrumentation::global())
    }

    /// Wraps a transport, bound to the given instrumentation.
    pub fn with_instrumentation(inner: T, instrumentation: Arc<Instrumentation>) -> Self {
        Self {
            inner,
            instrumentation,
        }
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Returns the instrumentation this handle reports to.
    pub fn instrumentation(&self) -> &Arc<Instrumentation> {
        &self.instrumentation
    }

    /// Unwraps the original transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn should_capture(&self) -> bool {
        self.instrumentation.is_enabled() && !capturing()
    }
}

impl<T: Transport> Transport for Instrumented<T> {
    type Request = T::Request;
    type Response = T::Response;
    type Error = T::Error;

    fn send(&self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        if !self.should_capture() {
            return self.inner.send(request);
        }
        CAPTURING.sync_scope(true, || {
            capture_sync(self.instrumentation.handlers(), &self.inner, request)
        })
    }
}

#[async_trait]
impl<T: AsyncTransport> AsyncTransport for Instrumented<T> {
    type Request = T::Request;
    type Response = T::Response;
    type Error = T::Error;

    async fn send(&self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        if !self.should_capture() {
            return self.inner.send(request).await;
        }
        CAPTURING
            .scope(
                true,
                capture_async(self.instrumentation.handlers(), &self.inner, request),
            )
            .await
    }
}

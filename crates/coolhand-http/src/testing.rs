//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use thiserror::Error;

use coolhand_core::{Body, CaptureEvent, Headers};

use crate::error::{CaptureError, Result};
use crate::instrument::Instrumentation;
use crate::transport::{AsyncTransport, InboundResponse, OutboundRequest, Transport};

/// Error returned by the mock transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MockError(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Body>,
}

impl MockRequest {
    pub fn post(url: &str) -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            method: "POST".to_string(),
            url: url.to_string(),
            headers,
            body: Some(Body::Bytes(Bytes::from_static(b"{\"model\": \"gpt-4\"}"))),
        }
    }
}

impl OutboundRequest for MockRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn headers(&self) -> Headers {
        self.headers.clone()
    }

    fn body(&self) -> Option<Body> {
        self.body.clone()
    }
}

#[derive(Debug, Default)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Headers,
    pub cached: Option<Bytes>,
    pub readable: Option<Bytes>,
    reads: AtomicUsize,
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// A 200 JSON response with a cached `{"result":"ok"}` body.
    pub fn ok_json() -> Self {
        Self::new(200)
            .with_header("content-type", "application/json")
            .with_cached(b"{\"result\":\"ok\"}")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_cached(mut self, body: &'static [u8]) -> Self {
        self.cached = Some(Bytes::from_static(body));
        self
    }

    pub fn with_readable(mut self, body: &'static [u8]) -> Self {
        self.readable = Some(Bytes::from_static(body));
        self
    }

    /// Number of times the body accessor ran.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InboundResponse for MockResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> Headers {
        self.headers.clone()
    }

    fn cached_body(&self) -> Option<Bytes> {
        self.cached.clone()
    }

    fn read_body(&self) -> Result<Bytes> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.readable.clone().ok_or(CaptureError::BodyUnavailable)
    }
}

type Respond = Box<dyn Fn(&MockRequest) -> std::result::Result<MockResponse, MockError> + Send + Sync>;

/// Records every request it receives and answers with a closure.
pub struct MockTransport {
    respond: Respond,
    received: Mutex<Vec<MockRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&MockRequest) -> std::result::Result<MockResponse, MockError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            received: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn ok_json() -> Self {
        Self::new(|_| Ok(MockResponse::ok_json()))
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_| Err(MockError(message.to_string())))
    }

    /// Makes async sends sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.received.lock().len()
    }

    pub fn received(&self) -> Vec<MockRequest> {
        self.received.lock().clone()
    }

    fn answer(&self, request: MockRequest) -> std::result::Result<MockResponse, MockError> {
        let result = (self.respond)(&request);
        self.received.lock().push(request);
        result
    }
}

impl Transport for MockTransport {
    type Request = MockRequest;
    type Response = MockResponse;
    type Error = MockError;

    fn send(&self, request: MockRequest) -> std::result::Result<MockResponse, MockError> {
        self.answer(request)
    }
}

#[async_trait]
impl AsyncTransport for MockTransport {
    type Request = MockRequest;
    type Response = MockResponse;
    type Error = MockError;

    async fn send(&self, request: MockRequest) -> std::result::Result<MockResponse, MockError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(request)
    }
}

/// An async transport that never completes.
pub struct PendingTransport;

#[async_trait]
impl AsyncTransport for PendingTransport {
    type Request = MockRequest;
    type Response = MockResponse;
    type Error = MockError;

    async fn send(&self, _request: MockRequest) -> std::result::Result<MockResponse, MockError> {
        std::future::pending().await
    }
}

/// Registers a handler on `instrumentation` that stores every event.
pub fn collect_events(instrumentation: &Instrumentation) -> Arc<Mutex<Vec<CaptureEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    instrumentation.set_handler(move |event| sink.lock().push(event));
    events
}

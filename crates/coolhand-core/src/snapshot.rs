//! Capture snapshots.
//!
//! A [`RequestSnapshot`] is taken when an intercepted call starts, a
//! [`ResponseSnapshot`] when it returns. Both are immutable copies; building
//! them never consumes anything the HTTP client still needs.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Body recorded in place of a streaming response.
pub const STREAMING_PLACEHOLDER: &str = "[streaming]";

/// Header name to value, as presented by the client.
///
/// Repeated headers are joined with `", "`.
pub type Headers = BTreeMap<String, String>;

/// A captured body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    /// Raw bytes, exactly as the client holds them.
    Bytes(#[serde(serialize_with = "serialize_bytes")] Bytes),
    /// Decoded text.
    Text(String),
    /// A structured value.
    Json(Value),
}

impl Body {
    /// The placeholder body for an unread stream.
    pub fn streaming_placeholder() -> Self {
        Body::Text(STREAMING_PLACEHOLDER.to_string())
    }

    /// Returns true if this is the streaming placeholder.
    pub fn is_streaming_placeholder(&self) -> bool {
        matches!(self, Body::Text(text) if text == STREAMING_PLACEHOLDER)
    }

    /// Returns the body as text when it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }

    /// Parses the body as JSON.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Body::Bytes(bytes) => serde_json::from_slice(bytes).ok(),
            Body::Text(text) => serde_json::from_str(text).ok(),
            Body::Json(value) => Some(value.clone()),
        }
    }

    /// Returns true for a zero-length body.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Bytes(bytes) => bytes.is_empty(),
            Body::Text(text) => text.is_empty(),
            Body::Json(value) => value.is_null(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Writes UTF-8 bodies as strings and anything else as a byte array.
fn serialize_bytes<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    match std::str::from_utf8(bytes) {
        Ok(text) => serializer.serialize_str(text),
        Err(_) => serializer.collect_seq(bytes.iter()),
    }
}

/// Looks up a header by name, ignoring ASCII case.
pub fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// An outgoing request, captured when the call starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Request body, when the client holds it in memory.
    pub body: Option<Body>,
    /// When the call started.
    pub timestamp: DateTime<Utc>,
}

impl RequestSnapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        headers: Headers,
        body: Option<Body>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers,
            body,
            timestamp: Utc::now(),
        }
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.headers, name)
    }
}

/// A response, captured when the call returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    pub headers: Headers,
    /// Response body, or the streaming placeholder.
    pub body: Option<Body>,
    /// When the response arrived.
    pub timestamp: DateTime<Utc>,
    /// Time from request start to response.
    pub duration: Duration,
    /// Whether the content type denotes a streaming body.
    pub is_streaming: bool,
}

impl ResponseSnapshot {
    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.headers, name)
    }

    /// Returns the response content type, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the duration in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis().min(u64::MAX as u128) as u64
    }
}

/// The outcome of one intercepted call.
///
/// Exactly one of [`response`](Self::response) and [`error`](Self::error) is
/// present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureEvent {
    request: RequestSnapshot,
    response: Option<ResponseSnapshot>,
    error: Option<String>,
}

impl CaptureEvent {
    /// Creates an event for a call that returned a response.
    pub fn completed(request: RequestSnapshot, response: ResponseSnapshot) -> Self {
        Self {
            request,
            response: Some(response),
            error: None,
        }
    }

    /// Creates an event for a call that failed.
    pub fn failed(request: RequestSnapshot, error: impl Into<String>) -> Self {
        Self {
            request,
            response: None,
            error: Some(error.into()),
        }
    }

    /// The request snapshot.
    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    /// The response snapshot, for completed calls.
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        self.response.as_ref()
    }

    /// The error message, for failed calls.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true if the call failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the event into its parts.
    pub fn into_parts(self) -> (RequestSnapshot, Option<ResponseSnapshot>, Option<String>) {
        (self.request, self.response, self.error)
    }
}

//! Transport capabilities.
//!
//! The capture pipeline never touches a concrete HTTP client. It works
//! against three small traits:
//!
//! - [`OutboundRequest`]: read-only accessors over an outgoing request
//! - [`InboundResponse`]: status, headers and the body capabilities
//!   {cached body, read body} queried in that order
//! - [`Transport`] / [`AsyncTransport`]: "send a request, get a response"
//!
//! Implementations are provided for `http` request/response types with
//! in-memory bodies, and (behind the `reqwest` feature) for reqwest's clients.

use std::collections::btree_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::HOST;
use hyper::{HeaderMap, Request, Response};

use coolhand_core::snapshot::header;
use coolhand_core::{Body, Headers};

use crate::error::{CaptureError, Result};

/// Read-only view of an outgoing request.
///
/// Every accessor must leave the request exactly as the transport will
/// receive it.
pub trait OutboundRequest {
    /// HTTP method.
    fn method(&self) -> &str;

    /// Absolute request URL.
    fn url(&self) -> String;

    /// Request headers.
    fn headers(&self) -> Headers;

    /// Body, when it is held in memory. Streamed bodies return `None`.
    fn body(&self) -> Option<Body>;
}

/// Read-only view of a received response.
#[async_trait]
pub trait InboundResponse: Send + Sync {
    /// HTTP status code.
    fn status(&self) -> u16;

    /// Response headers.
    fn headers(&self) -> Headers;

    /// Returns the content type header, if present.
    fn content_type(&self) -> Option<String> {
        header(&self.headers(), "content-type").map(str::to_string)
    }

    /// Body bytes the client has already buffered.
    fn cached_body(&self) -> Option<Bytes> {
        None
    }

    /// Reads the body through the client's accessor without consuming it.
    fn read_body(&self) -> Result<Bytes> {
        Err(CaptureError::BodyUnavailable)
    }

    /// Async form of [`read_body`](Self::read_body).
    async fn read_body_async(&self) -> Result<Bytes> {
        self.read_body()
    }
}

/// Synchronous "send a request, get a response" capability.
pub trait Transport: Send + Sync {
    /// Request type accepted by the transport.
    type Request: OutboundRequest;
    /// Response type returned by the transport.
    type Response: InboundResponse;
    /// Error type returned by the transport.
    type Error: std::fmt::Display;

    /// Sends a request.
    fn send(&self, request: Self::Request) -> std::result::Result<Self::Response, Self::Error>;
}

/// Asynchronous "send a request, get a response" capability.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    /// Request type accepted by the transport.
    type Request: OutboundRequest + Send + 'static;
    /// Response type returned by the transport.
    type Response: InboundResponse + 'static;
    /// Error type returned by the transport.
    type Error: std::fmt::Display + Send + 'static;

    /// Sends a request.
    async fn send(&self, request: Self::Request)
        -> std::result::Result<Self::Response, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Request = T::Request;
    type Response = T::Response;
    type Error = T::Error;

    fn send(&self, request: Self::Request) -> std::result::Result<Self::Response, Self::Error> {
        (**self).send(request)
    }
}

#[async_trait]
impl<T: AsyncTransport + ?Sized> AsyncTransport for Arc<T> {
    type Request = T::Request;
    type Response = T::Response;
    type Error = T::Error;

    async fn send(
        &self,
        request: Self::Request,
    ) -> std::result::Result<Self::Response, Self::Error> {
        (**self).send(request).await
    }
}

/// Converts an `http` header map, joining repeated names with `", "`.
///
/// Values that are not valid UTF-8 are decoded lossily.
pub fn headers_from_map(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match headers.entry(name.as_str().to_string()) {
            Entry::Occupied(mut existing) => {
                let existing = existing.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    headers
}

/// Builds an absolute URL for an `http` request.
///
/// Origin-form URIs (`/v1/messages`) are completed from the `Host` header.
fn request_url<B>(request: &Request<B>) -> String {
    let uri = request.uri();
    if uri.authority().is_some() {
        return uri.to_string();
    }

    match request.headers().get(HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => {
            let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
            format!("http://{}{}", host, path)
        }
        None => uri.to_string(),
    }
}

impl<B: AsRef<[u8]>> OutboundRequest for Request<B> {
    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn url(&self) -> String {
        request_url(self)
    }

    fn headers(&self) -> Headers {
        headers_from_map(Request::headers(self))
    }

    fn body(&self) -> Option<Body> {
        let bytes: &[u8] = Request::body(self).as_ref();
        if bytes.is_empty() {
            None
        } else {
            Some(Body::Bytes(Bytes::copy_from_slice(bytes)))
        }
    }
}

#[async_trait]
impl<B: AsRef<[u8]> + Send + Sync> InboundResponse for Response<B> {
    fn status(&self) -> u16 {
        Response::status(self).as_u16()
    }

    fn headers(&self) -> Headers {
        headers_from_map(Response::headers(self))
    }

    fn cached_body(&self) -> Option<Bytes> {
        let bytes: &[u8] = Response::body(self).as_ref();
        Some(Bytes::copy_from_slice(bytes))
    }
}

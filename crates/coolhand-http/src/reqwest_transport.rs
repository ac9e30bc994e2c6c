//! reqwest adapters.
//!
//! `reqwest::Client` is an [`AsyncTransport`] and `reqwest::blocking::Client`
//! a [`Transport`]. `send` returns as soon as the client does, with the body
//! unread. Only the capture path reads it: reqwest bodies can be read once,
//! so the bytes are kept in the response and handed back to the caller
//! through [`ReqwestResponse::into_body`].

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{HeaderMap, StatusCode};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use reqwest::Url;

use coolhand_core::{is_streaming_content_type, Body, Headers};

use crate::error::{CaptureError, Result};
use crate::transport::{
    headers_from_map, AsyncTransport, InboundResponse, OutboundRequest, Transport,
};

fn declares_streaming(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(is_streaming_content_type)
        .unwrap_or(false)
}

fn body_from_slice(bytes: Option<&[u8]>) -> Option<Body> {
    bytes
        .filter(|b| !b.is_empty())
        .map(|b| Body::Bytes(Bytes::copy_from_slice(b)))
}

impl OutboundRequest for reqwest::Request {
    fn method(&self) -> &str {
        reqwest::Request::method(self).as_str()
    }

    fn url(&self) -> String {
        reqwest::Request::url(self).to_string()
    }

    fn headers(&self) -> Headers {
        headers_from_map(reqwest::Request::headers(self))
    }

    fn body(&self) -> Option<Body> {
        body_from_slice(reqwest::Request::body(self).and_then(|b| b.as_bytes()))
    }
}

impl OutboundRequest for reqwest::blocking::Request {
    fn method(&self) -> &str {
        reqwest::blocking::Request::method(self).as_str()
    }

    fn url(&self) -> String {
        reqwest::blocking::Request::url(self).to_string()
    }

    fn headers(&self) -> Headers {
        headers_from_map(reqwest::blocking::Request::headers(self))
    }

    fn body(&self) -> Option<Body> {
        body_from_slice(reqwest::blocking::Request::body(self).and_then(|b| b.as_bytes()))
    }
}

/// What became of a response body.
#[derive(Debug)]
pub enum ResponseBody<R> {
    /// Read into memory while the call was captured.
    Buffered(Bytes),
    /// Never read; the stream is still open.
    Unread(R),
    /// Taken by a capture read that failed partway.
    Consumed,
}

/// Holds the client response until something reads it.
struct BodySlot<R> {
    unread: Mutex<Option<R>>,
    buffered: OnceCell<Bytes>,
}

impl<R> BodySlot<R> {
    fn new(response: R) -> Self {
        Self {
            unread: Mutex::new(Some(response)),
            buffered: OnceCell::new(),
        }
    }

    fn take(&self) -> Option<R> {
        self.unread.lock().take()
    }

    fn buffered(&self) -> Option<&Bytes> {
        self.buffered.get()
    }

    fn store(&self, bytes: Bytes) -> Bytes {
        self.buffered.get_or_init(|| bytes).clone()
    }

    fn into_body(self) -> ResponseBody<R> {
        if let Some(bytes) = self.buffered.into_inner() {
            return ResponseBody::Buffered(bytes);
        }
        match self.unread.into_inner() {
            Some(response) => ResponseBody::Unread(response),
            None => ResponseBody::Consumed,
        }
    }
}

impl<R> std::fmt::Debug for BodySlot<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.buffered() {
            Some(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            None if self.unread.lock().is_some() => f.write_str("Unread"),
            None => f.write_str("Consumed"),
        }
    }
}

/// A response from the async reqwest client.
#[derive(Debug)]
pub struct ReqwestResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: BodySlot<reqwest::Response>,
}

impl ReqwestResponse {
    fn new(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            body: BodySlot::new(response),
        }
    }

    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns true if the content type denotes a streaming body.
    pub fn is_streaming(&self) -> bool {
        declares_streaming(&self.headers)
    }

    /// The body, if the capture path has already read it.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.body.buffered()
    }

    /// Consumes the response, returning its body in whatever state it is in.
    pub fn into_body(self) -> ResponseBody<reqwest::Response> {
        self.body.into_body()
    }

    /// Consumes the response and reads the rest of its body.
    ///
    /// Returns `None` if a failed capture read already took the body.
    pub async fn into_bytes(self) -> reqwest::Result<Option<Bytes>> {
        match self.into_body() {
            ResponseBody::Buffered(bytes) => Ok(Some(bytes)),
            ResponseBody::Unread(response) => response.bytes().await.map(Some),
            ResponseBody::Consumed => Ok(None),
        }
    }
}

#[async_trait]
impl InboundResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn headers(&self) -> Headers {
        headers_from_map(&self.headers)
    }

    fn cached_body(&self) -> Option<Bytes> {
        self.body.buffered().cloned()
    }

    async fn read_body_async(&self) -> Result<Bytes> {
        if let Some(bytes) = self.body.buffered() {
            return Ok(bytes.clone());
        }
        let response = self.body.take().ok_or(CaptureError::BodyUnavailable)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CaptureError::BodyRead(e.to_string()))?;
        Ok(self.body.store(bytes))
    }
}

#[async_trait]
impl AsyncTransport for reqwest::Client {
    type Request = reqwest::Request;
    type Response = ReqwestResponse;
    type Error = reqwest::Error;

    async fn send(&self, request: reqwest::Request) -> reqwest::Result<ReqwestResponse> {
        self.execute(request).await.map(ReqwestResponse::new)
    }
}

/// A response from the blocking reqwest client.
#[derive(Debug)]
pub struct BlockingResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: BodySlot<reqwest::blocking::Response>,
}

impl BlockingResponse {
    fn new(response: reqwest::blocking::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            body: BodySlot::new(response),
        }
    }

    /// Returns the response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the final URL, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns true if the content type denotes a streaming body.
    pub fn is_streaming(&self) -> bool {
        declares_streaming(&self.headers)
    }

    /// The body, if the capture path has already read it.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.body.buffered()
    }

    /// Consumes the response, returning its body in whatever state it is in.
    pub fn into_body(self) -> ResponseBody<reqwest::blocking::Response> {
        self.body.into_body()
    }

    /// Consumes the response and reads the rest of its body.
    ///
    /// Returns `None` if a failed capture read already took the body.
    pub fn into_bytes(self) -> reqwest::Result<Option<Bytes>> {
        match self.into_body() {
            ResponseBody::Buffered(bytes) => Ok(Some(bytes)),
            ResponseBody::Unread(response) => response.bytes().map(Some),
            ResponseBody::Consumed => Ok(None),
        }
    }
}

#[async_trait]
impl InboundResponse for BlockingResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn headers(&self) -> Headers {
        headers_from_map(&self.headers)
    }

    fn cached_body(&self) -> Option<Bytes> {
        self.body.buffered().cloned()
    }

    fn read_body(&self) -> Result<Bytes> {
        if let Some(bytes) = self.body.buffered() {
            return Ok(bytes.clone());
        }
        let response = self.body.take().ok_or(CaptureError::BodyUnavailable)?;
        let bytes = response
            .bytes()
            .map_err(|e| CaptureError::BodyRead(e.to_string()))?;
        Ok(self.body.store(bytes))
    }
}

impl Transport for reqwest::blocking::Client {
    type Request = reqwest::blocking::Request;
    type Response = BlockingResponse;
    type Error = reqwest::Error;

    fn send(&self, request: reqwest::blocking::Request) -> reqwest::Result<BlockingResponse> {
        self.execute(request).map(BlockingResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use hyper::header::HeaderValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::instrument::Instrumentation;
    use crate::reader::{read_response_body, read_response_body_async};

    const JSON_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
        content-type: application/json\r\n\
        content-length: 15\r\n\
        connection: close\r\n\r\n\
        {\"result\":\"ok\"}";

    // One chunk, then the connection stays open.
    const OPEN_CHUNKED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
        content-type: application/json\r\n\
        transfer-encoding: chunked\r\n\r\n\
        5\r\nhello\r\n";

    /// Answers one connection with `response`, then holds it open.
    async fn serve_once(response: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        addr
    }

    /// Blocking counterpart of [`serve_once`]; closes after writing.
    fn serve_once_blocking(response: &'static [u8]) -> SocketAddr {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf);
            socket.write_all(response).unwrap();
        });
        addr
    }

    #[test]
    fn async_request_snapshot() {
        let client = reqwest::Client::new();
        let request = client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", "Bearer sk-test")
            .header("Content-Type", "application/json")
            .body("{\"model\": \"gpt-4\"}")
            .build()
            .unwrap();

        assert_eq!(OutboundRequest::method(&request), "POST");
        assert_eq!(
            OutboundRequest::url(&request),
            "https://api.openai.com/v1/chat/completions"
        );
        let headers = OutboundRequest::headers(&request);
        assert_eq!(headers.get("authorization").unwrap(), "Bearer sk-test");
        assert_eq!(
            OutboundRequest::body(&request).unwrap().as_text(),
            Some("{\"model\": \"gpt-4\"}")
        );
        // Still sendable with its body intact.
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()),
            Some(&b"{\"model\": \"gpt-4\"}"[..])
        );
    }

    #[test]
    fn async_request_without_body() {
        let request = reqwest::Client::new()
            .get("https://api.anthropic.com/v1/models")
            .build()
            .unwrap();
        assert!(OutboundRequest::body(&request).is_none());
        assert_eq!(OutboundRequest::method(&request), "GET");
    }

    #[test]
    fn blocking_request_snapshot() {
        let request = reqwest::blocking::Client::new()
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", "test")
            .body("{\"max_tokens\": 16}")
            .build()
            .unwrap();

        assert_eq!(OutboundRequest::method(&request), "POST");
        assert_eq!(
            OutboundRequest::url(&request),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(OutboundRequest::headers(&request).get("x-api-key").unwrap(), "test");
        assert_eq!(
            OutboundRequest::body(&request).unwrap().as_text(),
            Some("{\"max_tokens\": 16}")
        );
    }

    #[test]
    fn streaming_header_detection() {
        let mut headers = HeaderMap::new();
        assert!(!declares_streaming(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!declares_streaming(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream; charset=utf-8"),
        );
        assert!(declares_streaming(&headers));
    }

    #[tokio::test]
    async fn send_returns_before_body_completes() {
        for enabled in [false, true] {
            let addr = serve_once(OPEN_CHUNKED_RESPONSE).await;
            let instrumentation = Arc::new(Instrumentation::new());
            if enabled {
                instrumentation.enable();
            }
            let client = instrumentation.instrument(reqwest::Client::new());
            let request = reqwest::Client::new()
                .get(format!("http://{}/v1/chat/completions", addr))
                .build()
                .unwrap();

            let response = tokio::time::timeout(
                Duration::from_secs(2),
                AsyncTransport::send(&client, request),
            )
            .await
            .expect("send waited on the body")
            .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.bytes().is_none());
            assert!(matches!(response.into_body(), ResponseBody::Unread(_)));
        }
    }

    #[tokio::test]
    async fn caller_reads_unread_body() {
        let addr = serve_once(JSON_RESPONSE).await;
        let request = reqwest::Client::new()
            .get(format!("http://{}/v1/models", addr))
            .build()
            .unwrap();

        let response = AsyncTransport::send(&reqwest::Client::new(), request)
            .await
            .unwrap();
        assert_eq!(response.cached_body(), None);
        assert_eq!(
            response.into_bytes().await.unwrap(),
            Some(Bytes::from_static(b"{\"result\":\"ok\"}"))
        );
    }

    #[tokio::test]
    async fn capture_read_keeps_body_for_caller() {
        let addr = serve_once(JSON_RESPONSE).await;
        let request = reqwest::Client::new()
            .get(format!("http://{}/v1/models", addr))
            .build()
            .unwrap();

        let response = AsyncTransport::send(&reqwest::Client::new(), request)
            .await
            .unwrap();
        let captured = read_response_body_async(&response).await;

        assert_eq!(
            captured,
            Some(Body::Bytes(Bytes::from_static(b"{\"result\":\"ok\"}")))
        );
        assert_eq!(
            response.cached_body(),
            Some(Bytes::from_static(b"{\"result\":\"ok\"}"))
        );
        assert!(matches!(
            response.into_body(),
            ResponseBody::Buffered(bytes) if bytes == Bytes::from_static(b"{\"result\":\"ok\"}")
        ));
    }

    #[test]
    fn blocking_capture_read_keeps_body_for_caller() {
        let addr = serve_once_blocking(JSON_RESPONSE);
        let client = reqwest::blocking::Client::new();
        let request = client
            .get(format!("http://{}/v1/models", addr))
            .build()
            .unwrap();

        let response = Transport::send(&client, request).unwrap();
        assert!(response.bytes().is_none());

        let captured = read_response_body(&response).unwrap();
        assert_eq!(captured.as_text(), Some("{\"result\":\"ok\"}"));
        assert_eq!(
            response.into_bytes().unwrap(),
            Some(Bytes::from_static(b"{\"result\":\"ok\"}"))
        );
    }
}

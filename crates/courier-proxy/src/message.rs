//! HTTP message model
//!
//! A `Response` owns at most one `Body`, and a `Body` can be read exactly
//! once. Neither type is `Clone`: whoever holds a value may consume or drop
//! it freely without affecting anyone else.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version};
use std::fmt;
use std::pin::Pin;
use url::Url;

use crate::error::ProxyError;

/// Type alias for a boxed stream of body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

/// Header names describing the payload rather than the response
pub const CONTENT_HEADERS: &[&str] = &[
    "allow",
    "content-disposition",
    "content-encoding",
    "content-language",
    "content-length",
    "content-location",
    "content-md5",
    "content-range",
    "content-type",
    "expires",
    "last-modified",
];

/// Partition a wire header map into response-level and body-level headers
pub fn split_content_headers(headers: &HeaderMap) -> (HeaderMap, HeaderMap) {
    let mut response_headers = HeaderMap::new();
    let mut content_headers = HeaderMap::new();

    for (name, value) in headers.iter() {
        if CONTENT_HEADERS.contains(&name.as_str()) {
            content_headers.append(name.clone(), value.clone());
        } else {
            response_headers.append(name.clone(), value.clone());
        }
    }

    (response_headers, content_headers)
}

/// Outbound request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }
}

enum Payload {
    Full(Bytes),
    Stream(ByteStream),
}

/// Single-use response payload with its own content headers
pub struct Body {
    headers: HeaderMap,
    payload: Payload,
}

impl Body {
    /// Wrap an already buffered payload
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            headers: HeaderMap::new(),
            payload: Payload::Full(bytes.into()),
        }
    }

    /// Wrap a payload that is still arriving
    pub fn from_stream(stream: ByteStream) -> Self {
        Self {
            headers: HeaderMap::new(),
            payload: Payload::Stream(stream),
        }
    }

    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Whether the payload is already held in memory
    pub fn is_buffered(&self) -> bool {
        matches!(self.payload, Payload::Full(_))
    }

    /// Consume the body, returning its headers and the complete payload
    pub async fn collect(self) -> Result<(HeaderMap, Bytes), ProxyError> {
        let bytes = match self.payload {
            Payload::Full(bytes) => bytes,
            Payload::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                buf.freeze()
            }
        };

        Ok((self.headers, bytes))
    }

    /// Consume the body, returning the complete payload
    pub async fn bytes(self) -> Result<Bytes, ProxyError> {
        Ok(self.collect().await?.1)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = match &self.payload {
            Payload::Full(bytes) => format!("{} bytes", bytes.len()),
            Payload::Stream(_) => "stream".to_string(),
        };
        f.debug_struct("Body")
            .field("headers", &self.headers)
            .field("payload", &payload)
            .finish()
    }
}

/// Inbound response
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub reason: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Consume the response, returning the body payload (empty if absent)
    pub async fn bytes(self) -> Result<Bytes, ProxyError> {
        match self.body {
            Some(body) => body.bytes().await,
            None => Ok(Bytes::new()),
        }
    }
}

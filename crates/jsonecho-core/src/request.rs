//! HTTP Request types

use crate::{Error, Result};
use bytes::{Buf, Bytes};
use smallvec::SmallVec;
use std::io::Read;

/// HTTP Methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Parse from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            "CONNECT" => Ok(Method::Connect),
            "TRACE" => Ok(Method::Trace),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Streaming request body
///
/// Owned by the request and consumed exactly once by a handler.
pub struct Body {
    inner: Box<dyn Read + Send>,
}

impl Body {
    /// An empty body
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Wrap an arbitrary reader
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Box::new(reader),
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Body { .. }")
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_reader(bytes.reader())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(Bytes::from(s))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(s))
    }
}

/// HTTP Request
#[derive(Debug)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path (without query string)
    pub path: String,
    /// Request headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 16]>,
    /// Request body
    pub body: Body,
}

impl Request {
    /// Create a new request
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: SmallVec::new(),
            body: Body::empty(),
        }
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get content-length header
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
    }

    /// Take the body, leaving an empty one behind
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }
}

/// Builder for constructing requests
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Create a new builder
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request: Request::new(method, path),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Set an in-memory body
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Set a streaming body
    pub fn body_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.request.body = Body::from_reader(reader);
        self
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}

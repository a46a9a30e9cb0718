//! HTTP Response types

use smallvec::SmallVec;

/// HTTP Status Code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Get the numeric code
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Get the reason phrase
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Response headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 8]>,
    /// Response body
    pub body: bytes::Bytes,
}

impl Response {
    /// Create a new response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: SmallVec::new(),
            body: bytes::Bytes::new(),
        }
    }

    /// Create a 200 OK response
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a JSON response
    pub fn json(body: impl Into<bytes::Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::OK)
            .header("content-type", "application/json")
            .body(body)
            .build()
    }

    /// Create a 404 Not Found response
    pub fn not_found() -> Self {
        Self::plain(StatusCode::NOT_FOUND, "Not Found")
    }

    /// Create a 400 Bad Request response
    pub fn bad_request(message: &str) -> Self {
        Self::plain(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 500 Internal Server Error response
    pub fn internal_error(message: &str) -> Self {
        Self::plain(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Plain-text error body, newline terminated
    fn plain(status: StatusCode, message: &str) -> Self {
        ResponseBuilder::new(status)
            .header("content-type", "text/plain; charset=utf-8")
            .header("x-content-type-options", "nosniff")
            .body(format!("{}\n", message))
            .build()
    }

    /// Get a header value
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

    /// Get body as string (if UTF-8)
    pub fn body_string(&self) -> Option<String> {
        std::str::from_utf8(&self.body).ok().map(|s| s.to_string())
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

/// Builder for constructing responses
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Create a new builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            response: Response::new(status),
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.response.body = body.into();
        self
    }

    /// Build the response
    pub fn build(self) -> Response {
        self.response
    }
}

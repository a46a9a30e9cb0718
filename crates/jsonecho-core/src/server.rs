//! Native HTTP server implementation
//!
//! Serves the six echo handlers over HTTP/1.1 using hyper with:
//! - Multi-threaded tokio runtime
//! - Routing by path, `/{codec}/{strategy}`
//! - TCP_NODELAY for low latency
//! - Handlers on the blocking pool, since body reads and the pipe relay block

use crate::error::READ_BODY_FAILED;
use crate::{EchoConfig, Method, Request, Response, Result, Variant};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http_body_util::{BodyExt, Full, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
    pub workers: usize,
    /// Largest request body accepted, in bytes
    pub max_body_size: usize,
    pub echo: EchoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            hostname: "0.0.0.0".to_string(),
            workers: num_cpus::get(),
            max_body_size: 1024 * 1024,
            echo: EchoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn echo(mut self, echo: EchoConfig) -> Self {
        self.echo = echo;
        self
    }

    /// Build a multi-threaded runtime sized by `workers`
    pub fn build_runtime(&self) -> Result<tokio::runtime::Runtime> {
        Ok(tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.workers.max(1))
            .enable_all()
            .build()?)
    }
}

/// Bound HTTP/1.1 echo server
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Bind the listener without accepting yet
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.hostname.as_str(), config.port)).await?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until accepting fails
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            if let Err(e) = stream.set_nodelay(true) {
                eprintln!("Failed to set TCP_NODELAY: {}", e);
            }

            let config = Arc::clone(&self.config);
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let config = Arc::clone(&config);
                    async move { Ok::<_, Infallible>(dispatch(req, &config).await) }
                });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    eprintln!("Connection error: {}", e);
                }
            });
        }
    }
}

/// Route, collect the body and run the matching echo handler
pub async fn dispatch<B>(req: http::Request<B>, config: &ServerConfig) -> http::Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let Some(variant) = Variant::from_path(req.uri().path()) else {
        return to_http_response(Response::not_found());
    };

    let (parts, body) = req.into_parts();
    // Overflowing the limit and transport failures are both read failures.
    let body = match Limited::new(body, config.max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => return to_http_response(Response::bad_request(READ_BODY_FAILED)),
    };

    let request = from_http_parts(&parts, body);
    let echo = config.echo;
    let response = match tokio::task::spawn_blocking(move || variant.handle(request, echo)).await {
        Ok(res) => res,
        Err(e) => Response::internal_error(&e.to_string()),
    };

    to_http_response(response)
}

/// Convert http request parts plus a collected body to our Request type
pub fn from_http_parts(parts: &http::request::Parts, body: Bytes) -> Request {
    let method = Method::from_str(parts.method.as_str()).unwrap_or(Method::Get);
    let mut request = Request::new(method, parts.uri.path());

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    request.body = body.into();
    request
}

/// Convert our Response to an http Response
pub fn to_http_response(res: Response) -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(res.body));
    *response.status_mut() = http::StatusCode::from_u16(res.status.as_u16())
        .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in &res.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().append(name, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::error::PARSE_JSON_FAILED;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const BODY: &str = r#"{"name":"John Doe","tags":["developer","golang","backend"]}"#;

    fn post(path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn body_of(res: http::Response<Full<Bytes>>) -> Bytes {
        res.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_dispatch_every_variant() {
        let config = ServerConfig::new();
        for variant in Variant::ALL {
            let path = format!("/{}", variant.name());
            let res = dispatch(post(&path, BODY), &config).await;
            assert_eq!(res.status(), http::StatusCode::OK, "{}", variant);
            assert_eq!(res.headers()["content-type"], "application/json");

            let echoed: Value = serde_json::from_slice(&body_of(res).await).unwrap();
            assert_eq!(echoed, serde_json::from_str::<Value>(BODY).unwrap());
        }
    }

    #[tokio::test]
    async fn test_dispatch_unknown_route() {
        let res = dispatch(post("/protobuf/decode", BODY), &ServerConfig::new()).await;
        assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_bad_json() {
        let res = dispatch(post("/simd_json/pipe", "not json"), &ServerConfig::new()).await;
        assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        let body = body_of(res).await;
        assert!(std::str::from_utf8(&body).unwrap().contains(PARSE_JSON_FAILED));
    }

    #[tokio::test]
    async fn test_dispatch_body_over_limit() {
        let config = ServerConfig::new().max_body_size(8);
        let res = dispatch(post("/serde_json/unmarshal", BODY), &config).await;
        assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
        let body = body_of(res).await;
        assert!(std::str::from_utf8(&body).unwrap().contains(READ_BODY_FAILED));
    }

    #[test]
    fn test_from_http_parts() {
        let (parts, _) = post("/serde_json/decode", BODY).into_parts();
        let req = from_http_parts(&parts, Bytes::from_static(b"{}"));
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/serde_json/decode");
        assert_eq!(req.content_type(), Some("application/json"));
    }

    #[test]
    fn test_build_runtime() {
        let runtime = ServerConfig::new().workers(1).build_runtime().unwrap();
        let answer = runtime.block_on(async { 42 });
        assert_eq!(answer, 42);
    }

    #[tokio::test]
    async fn test_serve_over_socket() {
        let server = Server::bind(ServerConfig::new().hostname("127.0.0.1").port(0))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /simd_json/decode HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            BODY.len(),
            BODY
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8(raw).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"), "{}", text);
        assert!(text.contains("John Doe"));
    }
}

//! Echo handler
//!
//! Decodes the request body into a [`Document`] and writes it straight
//! back. The three strategies differ only in how body bytes reach the
//! decoder.

use crate::codec::{Codec, Document};
use crate::pipe::{self, PipeConfig};
use crate::request::Body;
use crate::{EchoConfig, Error, Request, Response, Result};
use bytes::{BufMut, BytesMut};
use std::io::{self, Read};
use std::marker::PhantomData;
use std::thread;

use super::Handler;

/// How the body reaches the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Buffer the whole body, then parse the buffer
    Unmarshal,
    /// Decode directly from the body stream
    Decode,
    /// Relay the body through an in-process pipe on a separate thread
    Pipe,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Unmarshal, Strategy::Decode, Strategy::Pipe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Unmarshal => "unmarshal",
            Strategy::Decode => "decode",
            Strategy::Pipe => "pipe",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|strategy| strategy.as_str() == s)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Echo handler for one codec and one strategy
pub struct Echo<C: Codec> {
    strategy: Strategy,
    config: EchoConfig,
    _codec: PhantomData<fn() -> C>,
}

impl<C: Codec> Echo<C> {
    pub fn new(strategy: Strategy) -> Self {
        Self::with_config(strategy, EchoConfig::default())
    }

    pub fn with_config(strategy: Strategy, config: EchoConfig) -> Self {
        Self {
            strategy,
            config,
            _codec: PhantomData,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Decode the body of `req` with this handler's strategy
    pub fn decode_body(&self, req: &mut Request) -> Result<Document> {
        let body = req.take_body();
        match self.strategy {
            Strategy::Unmarshal => unmarshal::<C>(body),
            Strategy::Decode => C::decode(body),
            Strategy::Pipe => decode_piped::<C>(body, self.config.pipe),
        }
    }

    /// Handle a request
    pub fn handle(&self, mut req: Request) -> Response {
        let doc = match self.decode_body(&mut req) {
            Ok(doc) => doc,
            Err(err) => return Response::bad_request(err.diagnostic()),
        };

        let mut out = BytesMut::new().writer();
        match C::encode(&doc, &mut out) {
            Ok(()) => Response::json(out.into_inner().freeze()),
            Err(err) => Response::internal_error(&err.to_string()),
        }
    }
}

impl<C: Codec> Handler for Echo<C> {
    fn handle(&self, req: Request) -> Response {
        Echo::handle(self, req)
    }
}

impl<C: Codec> std::fmt::Debug for Echo<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Echo")
            .field("codec", &C::NAME)
            .field("strategy", &self.strategy)
            .finish()
    }
}

fn unmarshal<C: Codec>(mut body: Body) -> Result<Document> {
    let mut buf = Vec::new();
    body.read_to_end(&mut buf).map_err(Error::ReadBody)?;
    C::unmarshal(&mut buf)
}

/// Decode from a pipe fed by a relay thread.
///
/// The relay owns the write half and drops it on every exit path, so the
/// decoder always sees end-of-stream or the copy error. The relay is
/// joined before returning.
fn decode_piped<C: Codec>(mut body: Body, config: PipeConfig) -> Result<Document> {
    let (reader, mut writer) = pipe::pipe(config);

    let relay = thread::Builder::new()
        .name("body-relay".to_string())
        .spawn(move || {
            if let Err(err) = io::copy(&mut body, &mut writer) {
                writer.close_with_error(err);
            }
        })
        .map_err(Error::Relay)?;

    // Takes the reader by value: dropping it releases a writer still
    // blocked on a full buffer.
    let decoded = C::decode(reader);

    relay.join().map_err(|_| Error::RelayPanicked)?;
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{SerdeJson, SimdJson, Value};
    use crate::error::{PARSE_JSON_FAILED, READ_BODY_FAILED};
    use crate::{Method, RequestBuilder, StatusCode};

    /// Yields `prefix`, then fails
    struct FailingReader {
        prefix: io::Cursor<Vec<u8>>,
    }

    impl FailingReader {
        fn new(prefix: &str) -> Self {
            Self {
                prefix: io::Cursor::new(prefix.as_bytes().to_vec()),
            }
        }
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.prefix.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream reset"))
        }
    }

    fn post(body: &'static str) -> Request {
        RequestBuilder::new(Method::Post, "/").body(body).build()
    }

    #[test]
    fn test_pipe_surfaces_copy_error_as_decode_cause() {
        let mut req = RequestBuilder::new(Method::Post, "/")
            .body_reader(FailingReader::new(r#"{"name":"Jo"#))
            .build();

        let err = Echo::<SerdeJson>::new(Strategy::Pipe)
            .decode_body(&mut req)
            .unwrap_err();
        assert!(matches!(err, Error::SerdeJson(_)));
        assert!(err.to_string().contains("upstream reset"));
        assert_eq!(err.diagnostic(), PARSE_JSON_FAILED);
    }

    #[test]
    fn test_pipe_mid_read_failure_is_bad_request() {
        let broken = || {
            RequestBuilder::new(Method::Post, "/")
                .body_reader(FailingReader::new(r#"{"a":[1,2"#))
                .build()
        };

        for res in [
            Echo::<SerdeJson>::new(Strategy::Pipe).handle(broken()),
            Echo::<SerdeJson>::new(Strategy::Decode).handle(broken()),
            Echo::<SimdJson>::new(Strategy::Pipe).handle(broken()),
        ] {
            assert_eq!(res.status, StatusCode::BAD_REQUEST);
            assert!(res.body_string().unwrap().contains(PARSE_JSON_FAILED));
        }
    }

    #[test]
    fn test_unmarshal_read_failure() {
        let res = Echo::<SimdJson>::new(Strategy::Unmarshal).handle(
            RequestBuilder::new(Method::Post, "/")
                .body_reader(FailingReader::new("{"))
                .build(),
        );
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body_string().unwrap(), format!("{}\n", READ_BODY_FAILED));
    }

    #[test]
    fn test_pipe_with_tiny_buffer() {
        let handler =
            Echo::<SerdeJson>::with_config(Strategy::Pipe, EchoConfig::new().pipe_capacity(3));
        let res = handler.handle(post(r#"{"message":"relayed three bytes at a time"}"#));

        assert_eq!(res.status, StatusCode::OK);
        let echoed: Value = serde_json::from_slice(&res.body).unwrap();
        assert_eq!(echoed["message"], "relayed three bytes at a time");
    }

    #[test]
    fn test_pipe_releases_relay_on_early_decode() {
        // The decoder stops after the first value while the relay still has
        // bytes to push through a one-byte pipe.
        let handler =
            Echo::<SerdeJson>::with_config(Strategy::Pipe, EchoConfig::new().pipe_capacity(1));
        let res = handler.handle(post(r#"{"a":1}          {"b":2}"#));
        assert_eq!(res.status, StatusCode::OK);
    }

    #[test]
    fn test_debug_names_codec() {
        let dbg = format!("{:?}", Echo::<SimdJson>::new(Strategy::Decode));
        assert!(dbg.contains("simd_json"));
        assert!(dbg.contains("Decode"));
    }
}

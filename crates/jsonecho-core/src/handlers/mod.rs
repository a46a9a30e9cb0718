//! Echo request handlers
//!
//! Six handlers with one external contract: a JSON object body is echoed
//! back with 200, anything unreadable or unparsable gets a 400.
//!
//! | codec        | unmarshal | decode | pipe |
//! |--------------|-----------|--------|------|
//! | `serde_json` | [`handle_json_unmarshal`] | [`handle_json_decode`] | [`handle_json_pipe`] |
//! | `simd_json`  | [`handle_simd_json_unmarshal`] | [`handle_simd_json_decode`] | [`handle_simd_json_pipe`] |

pub mod echo;

pub use echo::{Echo, Strategy};

use crate::codec::{CodecKind, SerdeJson, SimdJson};
use crate::{EchoConfig, Request, Response};

/// Request handler
pub trait Handler: Send + Sync {
    fn handle(&self, req: Request) -> Response;
}

/// One codec/strategy combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variant {
    pub codec: CodecKind,
    pub strategy: Strategy,
}

impl Variant {
    pub const ALL: [Variant; 6] = [
        Variant::new(CodecKind::SerdeJson, Strategy::Unmarshal),
        Variant::new(CodecKind::SerdeJson, Strategy::Decode),
        Variant::new(CodecKind::SerdeJson, Strategy::Pipe),
        Variant::new(CodecKind::SimdJson, Strategy::Unmarshal),
        Variant::new(CodecKind::SimdJson, Strategy::Decode),
        Variant::new(CodecKind::SimdJson, Strategy::Pipe),
    ];

    pub const fn new(codec: CodecKind, strategy: Strategy) -> Self {
        Self { codec, strategy }
    }

    /// `codec/strategy`, e.g. `serde_json/pipe`
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Match a request path of the form `/codec/strategy`
    pub fn from_path(path: &str) -> Option<Self> {
        let (codec, strategy) = path.trim_matches('/').split_once('/')?;
        Some(Self::new(
            CodecKind::from_str(codec)?,
            Strategy::from_str(strategy)?,
        ))
    }

    /// Build a boxed handler for this variant
    pub fn handler(&self, config: EchoConfig) -> Box<dyn Handler> {
        match self.codec {
            CodecKind::SerdeJson => Box::new(Echo::<SerdeJson>::with_config(self.strategy, config)),
            CodecKind::SimdJson => Box::new(Echo::<SimdJson>::with_config(self.strategy, config)),
        }
    }

    /// Handle `req` with this variant
    pub fn handle(&self, req: Request, config: EchoConfig) -> Response {
        match self.codec {
            CodecKind::SerdeJson => Echo::<SerdeJson>::with_config(self.strategy, config).handle(req),
            CodecKind::SimdJson => Echo::<SimdJson>::with_config(self.strategy, config).handle(req),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.codec, self.strategy)
    }
}

/// serde_json, whole body buffered then parsed
pub fn handle_json_unmarshal(req: Request) -> Response {
    Echo::<SerdeJson>::new(Strategy::Unmarshal).handle(req)
}

/// serde_json, decoded from the body stream
pub fn handle_json_decode(req: Request) -> Response {
    Echo::<SerdeJson>::new(Strategy::Decode).handle(req)
}

/// serde_json, decoded from a relay pipe
pub fn handle_json_pipe(req: Request) -> Response {
    Echo::<SerdeJson>::new(Strategy::Pipe).handle(req)
}

/// simd-json, whole body buffered then parsed
pub fn handle_simd_json_unmarshal(req: Request) -> Response {
    Echo::<SimdJson>::new(Strategy::Unmarshal).handle(req)
}

/// simd-json, decoded from the body stream
pub fn handle_simd_json_decode(req: Request) -> Response {
    Echo::<SimdJson>::new(Strategy::Decode).handle(req)
}

/// simd-json, decoded from a relay pipe
pub fn handle_simd_json_pipe(req: Request) -> Response {
    Echo::<SimdJson>::new(Strategy::Pipe).handle(req)
}

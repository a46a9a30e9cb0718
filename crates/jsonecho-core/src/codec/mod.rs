//! JSON codecs
//!
//! Both JSON libraries sit behind one [`Codec`] capability so every body
//! decode strategy is written once and instantiated per codec.
//!
//! - [`SerdeJson`] - the baseline `serde_json` codec
//! - [`SimdJson`] - the `simd-json` drop-in alternative

mod simd;
mod standard;

pub use simd::SimdJson;
pub use standard::SerdeJson;

use crate::Result;
use std::io::{Read, Write};

/// Untyped JSON value (null / bool / number / string / array / object)
pub use serde_json::Value;

/// A decoded request body: string keys mapped to JSON values
pub type Document = serde_json::Map<String, Value>;

/// Paired encode/decode logic for one JSON implementation
pub trait Codec: Send + Sync + 'static {
    /// Short name used in routes and benchmark ids
    const NAME: &'static str;

    /// Parse a fully buffered body
    ///
    /// The buffer may be modified in place.
    fn unmarshal(buf: &mut [u8]) -> Result<Document>;

    /// Decode a document straight from a byte stream
    fn decode<R: Read>(reader: R) -> Result<Document>;

    /// Write `doc` as compact JSON followed by a newline
    fn encode<W: Write>(doc: &Document, writer: W) -> Result<()>;
}

/// The JSON libraries under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    SerdeJson,
    SimdJson,
}

impl CodecKind {
    pub const ALL: [CodecKind; 2] = [CodecKind::SerdeJson, CodecKind::SimdJson];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::SerdeJson => SerdeJson::NAME,
            CodecKind::SimdJson => SimdJson::NAME,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

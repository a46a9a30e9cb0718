//! jsonecho-core: JSON echo handlers for body decode benchmarks
//!
//! Six handlers with the same HTTP contract, differing only in how the
//! request body reaches the JSON decoder (buffered, streamed, or relayed
//! through an in-process pipe) and in which codec decodes it.
//!
//! ## Features
//! - `native` - HTTP/1.1 server adapter with tokio/hyper

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod pipe;
pub mod request;
pub mod response;

#[cfg(feature = "native")]
pub mod server;

// Re-exports
pub use codec::{Codec, CodecKind, Document, SerdeJson, SimdJson, Value};
pub use config::EchoConfig;
pub use error::{Error, Result};
pub use request::{Body, Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};

// Handlers re-exports
pub use handlers::{
    Echo, Handler, Strategy, Variant,
    handle_json_unmarshal, handle_json_decode, handle_json_pipe,
    handle_simd_json_unmarshal, handle_simd_json_decode, handle_simd_json_pipe,
};

pub use pipe::{pipe, PipeConfig, PipeReader, PipeWriter};

#[cfg(feature = "native")]
pub use server::{Server, ServerConfig, dispatch, from_http_parts, to_http_response};

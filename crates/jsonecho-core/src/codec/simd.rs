//! Alternative codec backed by simd-json

use super::{Codec, Document};
use crate::{Error, Result};
use std::io::{Read, Write};

/// simd-json codec
#[derive(Debug, Clone, Copy, Default)]
pub struct SimdJson;

impl Codec for SimdJson {
    const NAME: &'static str = "simd_json";

    fn unmarshal(buf: &mut [u8]) -> Result<Document> {
        // simd-json decodes a lone surrogate escape to U+0000 instead of
        // failing, so those are caught before the parser sees them.
        check_surrogates(buf)?;
        Ok(simd_json::serde::from_slice(buf)?)
    }

    fn decode<R: Read>(mut reader: R) -> Result<Document> {
        // simd-json needs the whole input in one mutable buffer.
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).map_err(Error::DecodeStream)?;
        Self::unmarshal(&mut buf)
    }

    fn encode<W: Write>(doc: &Document, mut writer: W) -> Result<()> {
        simd_json::serde::to_writer(&mut writer, doc)?;
        writer.write_all(b"\n").map_err(Error::WriteBody)?;
        Ok(())
    }
}

/// Value of a `\uXXXX` escape starting at `at`
fn unicode_escape(buf: &[u8], at: usize) -> Option<u16> {
    match buf.get(at..at + 2)? {
        [b'\\', b'u'] => {}
        _ => return None,
    }
    buf.get(at + 2..at + 6)?
        .iter()
        .try_fold(0u16, |acc, &b| Some(acc << 4 | (b as char).to_digit(16)? as u16))
}

/// Reject `\uD800`-`\uDFFF` escapes that do not form a high/low pair
fn check_surrogates(buf: &[u8]) -> Result<()> {
    let mut i = 0;
    while let Some(pos) = buf.get(i..).and_then(|rest| memchr::memchr(b'\\', rest)) {
        let at = i + pos;
        i = match unicode_escape(buf, at) {
            Some(0xD800..=0xDBFF) => match unicode_escape(buf, at + 6) {
                Some(0xDC00..=0xDFFF) => at + 12,
                _ => return Err(Error::LoneSurrogate { offset: at }),
            },
            Some(0xDC00..=0xDFFF) => return Err(Error::LoneSurrogate { offset: at }),
            Some(_) => at + 6,
            // `\\`, `\"` and friends; malformed escapes are left to the parser
            None => at + 2,
        };
    }
    Ok(())
}

//! Baseline codec backed by serde_json

use super::{Codec, Document};
use crate::{Error, Result};
use serde::Deserialize;
use std::io::{BufReader, Read, Write};

/// serde_json codec
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJson;

impl Codec for SerdeJson {
    const NAME: &'static str = "serde_json";

    fn unmarshal(buf: &mut [u8]) -> Result<Document> {
        let mut de = serde_json::Deserializer::from_slice(buf);
        de.disable_recursion_limit();
        let doc = Document::deserialize(&mut de)?;
        de.end()?;
        Ok(doc)
    }

    fn decode<R: Read>(reader: R) -> Result<Document> {
        // Reads one value and leaves anything after it unread.
        let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));
        de.disable_recursion_limit();
        Ok(Document::deserialize(&mut de)?)
    }

    fn encode<W: Write>(doc: &Document, mut writer: W) -> Result<()> {
        serde_json::to_writer(&mut writer, doc)?;
        writer.write_all(b"\n").map_err(Error::WriteBody)?;
        Ok(())
    }
}

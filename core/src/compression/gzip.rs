//! gzip members via flate2.
//!
//! The gzip header reserves bytes 4..8 for MTIME. Decoders ignore it, so the
//! framing layer is free to store the member length there.

use std::io::{Read, Write};

use flate2::{bufread::GzDecoder, write::GzEncoder, Compression};

use crate::compression::types::{Codec, CodecError};
use crate::constants::{DEFAULT_LEVEL, MAX_CHUNK_SIZE, MAX_LEVEL};

const CODEC: &str = "gzip";

#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl GzipCodec {
    pub fn new(level: u32) -> Result<Self, CodecError> {
        if level > MAX_LEVEL {
            return Err(CodecError::CodecInitFailed {
                codec: CODEC.into(),
                msg: format!("level {level} outside 0..={MAX_LEVEL}"),
            });
        }
        Ok(Self { level: Compression::new(level) })
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self { level: Compression::new(DEFAULT_LEVEL) }
    }
}

fn process_failed(e: std::io::Error) -> CodecError {
    CodecError::CodecProcessFailed { codec: CODEC.into(), msg: e.to_string() }
}

impl Codec for GzipCodec {
    fn name(&self) -> &'static str {
        CODEC
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        if input.len() > MAX_CHUNK_SIZE {
            return Err(CodecError::ChunkTooLarge { have: input.len(), max: MAX_CHUNK_SIZE });
        }
        // Encode this chunk as its own gzip member
        let mut enc = GzEncoder::new(Vec::with_capacity(input.len() / 2 + 64), self.level);
        enc.write_all(input).map_err(process_failed)?;
        enc.finish().map_err(process_failed)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut dec = GzDecoder::new(input);
        let mut out = Vec::new();
        dec.read_to_end(&mut out).map_err(process_failed)?;

        // A frame is exactly one member; anything after it means the length field lied.
        let rest = dec.into_inner();
        if !rest.is_empty() {
            return Err(CodecError::TrailingData { codec: CODEC.into(), extra: rest.len() });
        }
        Ok(out)
    }
}

//! Compress / decompress variant.
//!
//! Each direction is two plain function values: how the reader splits the
//! input into chunk payloads, and how a worker turns one payload into its
//! output bytes. Chosen once per run.

use std::fmt;
use std::io::Read;

use bytes::Bytes;
use serde::Serialize;

use crate::compression::Codec;
use crate::stream::framing::stamp_frame_len;
use crate::stream::io::{read_frame, read_window};
use crate::telemetry::Stage;
use crate::types::StreamError;

/// Reader policy: next payload, or `None` at a clean end of input.
pub type SplitFn = fn(&mut dyn Read, usize) -> Result<Option<Bytes>, StreamError>;

/// Worker policy: transformed payload for one chunk.
pub type TransformFn = fn(&dyn Codec, &[u8]) -> Result<Bytes, StreamError>;

#[derive(Clone, Copy)]
pub struct DirectionPolicy {
    pub split: SplitFn,
    pub transform: TransformFn,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Compress,
    Decompress,
}

impl Direction {
    /// Case-insensitive CLI mode word.
    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode.to_ascii_lowercase().as_str() {
            "compress" => Some(Direction::Compress),
            "decompress" => Some(Direction::Decompress),
            _ => None,
        }
    }

    pub fn policy(self) -> DirectionPolicy {
        match self {
            Direction::Compress => DirectionPolicy {
                split: read_window,
                transform: compress_frame,
                stage: Stage::Compress,
            },
            Direction::Decompress => DirectionPolicy {
                split: split_frame,
                transform: decompress_frame,
                stage: Stage::Decompress,
            },
        }
    }

    pub fn routine_name(self) -> &'static str {
        match self {
            Direction::Compress => "Compression",
            Direction::Decompress => "Decompression",
        }
    }

    /// Thread name prefixes: what the reader sees, what the writer emits.
    pub fn initial_state(self) -> &'static str {
        match self {
            Direction::Compress => "Raw",
            Direction::Decompress => "Compressed",
        }
    }

    pub fn final_state(self) -> &'static str {
        match self {
            Direction::Compress => "Compressed",
            Direction::Decompress => "Decompressed",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Compress => f.write_str("compress"),
            Direction::Decompress => f.write_str("decompress"),
        }
    }
}

// Frames carry their own length, so the window size is ignored.
fn split_frame(reader: &mut dyn Read, _window: usize) -> Result<Option<Bytes>, StreamError> {
    read_frame(reader)
}

fn compress_frame(codec: &dyn Codec, raw: &[u8]) -> Result<Bytes, StreamError> {
    let mut member = codec.compress(raw)?;
    stamp_frame_len(&mut member)?;
    Ok(Bytes::from(member))
}

fn decompress_frame(codec: &dyn Codec, frame: &[u8]) -> Result<Bytes, StreamError> {
    Ok(Bytes::from(codec.decompress(frame)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::GzipCodec;
    use crate::stream::framing::parse_frame_header;

    #[test]
    fn mode_words_are_case_insensitive() {
        assert_eq!(Direction::from_mode("Compress"), Some(Direction::Compress));
        assert_eq!(Direction::from_mode("DECOMPRESS"), Some(Direction::Decompress));
        assert_eq!(Direction::from_mode("zip"), None);
    }

    #[test]
    fn compress_policy_produces_self_describing_frame() {
        let codec = GzipCodec::default();
        let frame = (Direction::Compress.policy().transform)(&codec, b"abcabcabc").unwrap();
        let header = parse_frame_header(&frame).unwrap();
        assert_eq!(header.frame_len as usize, frame.len());

        let raw = (Direction::Decompress.policy().transform)(&codec, &frame).unwrap();
        assert_eq!(&raw[..], b"abcabcabc");
    }
}

//! compression/types.rs
//! Codec trait and its error type.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("codec {codec} init failed: {msg}")]
    CodecInitFailed { codec: String, msg: String },

    #[error("codec {codec} process failed: {msg}")]
    CodecProcessFailed { codec: String, msg: String },

    /// Bytes left over after the member ended.
    #[error("trailing data after {codec} member: {extra} bytes")]
    TrailingData { codec: String, extra: usize },

    #[error("chunk too large: {have} > {max}")]
    ChunkTooLarge { have: usize, max: usize },
}

/// Stateless chunk transform shared by every worker thread.
///
/// `compress` must return one self-contained member whose first 8 bytes are
/// header bytes the framing layer may overwrite at offset 4..8 without
/// affecting `decompress`.
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError>;
}

use std::io;
use thiserror::Error;

use crate::{
    compression::CodecError,
    stream::framing::FrameError,
};

/// Unified stream error covering I/O, framing, codec, cancellation and configuration.
/// - `From<T>` impls enable `?` inside every pipeline stage.
/// - Messages are stable; the CLI prints them verbatim after `Error: `.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Read or write failure on the input or output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed compressed data or a transform failure inside a worker.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Frame boundary could not be followed while re-chunking an archive.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// User-triggered interruption.
    #[error("operation cancelled")]
    Cancelled,

    /// A blocked queue operation was released by `stop()`.
    #[error("pipeline terminated")]
    Terminated,

    /// A pipeline thread could not be started or panicked.
    #[error("pipeline error: {0}")]
    PipelineError(String),

    /// Rejected pipeline configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StreamError {
    /// True for the user-triggered path; the CLI words its message differently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }
}

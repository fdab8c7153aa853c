//! chunkzip-core
//!
//! Chunked parallel gzip engine.
//! No CLI, no signal handling, no process-wide state.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod compression;
pub mod telemetry;
pub mod validation;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{Codec, CodecError, GzipCodec};
    pub use crate::stream::{
        compress_file, decompress_file, run_pipeline, Direction, InterruptHandle, OrderingMode,
        PipelineConfig,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
    pub use crate::validation::{check, ValidationError};
}

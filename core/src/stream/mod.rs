//! stream: the parallel chunk pipeline.
//!
//! reader -> read-queue -> workers -> ordering gate -> write-queue -> writer,
//! all coordinated through one `Coordinator` per run.

pub mod chunk;
pub mod coordinator;
pub mod core;
pub mod direction;
pub mod framing;
pub mod interrupt;
pub mod io;
pub mod parallelism;
pub mod pipeline;
pub mod worker;

pub use chunk::Chunk;
pub use coordinator::{Coordinator, OrderingMode, PipelineState};
pub use self::core::{compress_file, decompress_file, process_file_with_codec, run_to_output};
pub use direction::{Direction, DirectionPolicy};
pub use interrupt::InterruptHandle;
pub use parallelism::ParallelismProfile;
pub use pipeline::{run_pipeline, PipelineConfig};

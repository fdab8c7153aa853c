//! On-disk framing.
//!
//! Responsibilities:
//! - Stamp the total frame length into a freshly compressed member
//! - Parse the 8-byte prefix read at every frame boundary
//!
//! Non-responsibilities:
//! - Compression
//! - IO
//! - Parallelism

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{FrameError, FrameHeader};
pub use encode::stamp_frame_len;
pub use decode::{parse_frame_header, walk_frames};

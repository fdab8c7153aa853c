//! compression/mod.rs
//! Per-chunk compression behind a single trait.
//!
//! Notes:
//! - Every chunk is compressed as its own gzip member; there is no state that
//!   spans chunks, so workers can run them in any order.
//! - The pipeline only sees `Codec`; tests inject their own implementations.

pub mod types;
pub mod gzip;

pub use types::*;
pub use gzip::GzipCodec;

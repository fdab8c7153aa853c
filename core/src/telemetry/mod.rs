//! telemetry/mod.rs
//! Counters, stage timers and the immutable end-of-run snapshot.
//!
//! Each pipeline thread fills its own `StageReport`; reports are merged after
//! the threads join, so no stage ever shares a counter.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;

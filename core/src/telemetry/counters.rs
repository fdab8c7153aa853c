//! telemetry/counters.rs
//! Per-thread counters, merged into a `TelemetrySnapshot` at pipeline end.
use std::ops::AddAssign;

use serde::Serialize;

use crate::telemetry::timers::StageTimes;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TelemetryCounters {
    pub chunks_read: u64,
    pub chunks_transformed: u64,
    pub chunks_written: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl TelemetryCounters {
    /// One payload handed to the read-queue.
    pub fn add_read(&mut self, len: usize) {
        self.chunks_read += 1;
        self.bytes_read += len as u64;
    }

    pub fn add_transformed(&mut self) {
        self.chunks_transformed += 1;
    }

    /// One payload appended to the output.
    pub fn add_written(&mut self, len: usize) {
        self.chunks_written += 1;
        self.bytes_written += len as u64;
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks_read += other.chunks_read;
        self.chunks_transformed += other.chunks_transformed;
        self.chunks_written += other.chunks_written;
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}

/// What one pipeline thread hands back when it joins.
#[derive(Default, Clone, Debug)]
pub struct StageReport {
    pub counters: TelemetryCounters,
    pub times: StageTimes,
}

impl StageReport {
    pub fn merge(&mut self, other: &StageReport) {
        self.counters.merge(&other.counters);
        self.times.merge(&other.times);
    }
}

//! telemetry/snapshot.rs
//! Immutable summary of a finished run.

use std::time::Duration;

use serde::Serialize;

use crate::stream::{Direction, OrderingMode};
use crate::telemetry::counters::{StageReport, TelemetryCounters};
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub direction: Direction,
    pub ordering: OrderingMode,
    pub workers: usize,
    pub queue_limit: usize,
    pub counters: TelemetryCounters,
    /// compressed bytes / raw bytes, whichever side is which for `direction`.
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    /// Highest occupancy seen on the read-queue and write-queue.
    pub read_queue_peak: usize,
    pub write_queue_peak: usize,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

/// Run-level facts the snapshot needs besides the merged stage reports.
#[derive(Debug, Clone, Copy)]
pub struct RunShape {
    pub direction: Direction,
    pub ordering: OrderingMode,
    pub workers: usize,
    pub queue_limit: usize,
    pub queue_peaks: (usize, usize),
}

impl TelemetrySnapshot {
    pub fn from(shape: RunShape, report: &StageReport, timer: &TelemetryTimer) -> Self {
        let counters = report.counters.clone();
        let elapsed = timer.elapsed();

        let (raw, compressed) = match shape.direction {
            Direction::Compress => (counters.bytes_read, counters.bytes_written),
            Direction::Decompress => (counters.bytes_written, counters.bytes_read),
        };
        let compression_ratio = if raw > 0 { compressed as f64 / raw as f64 } else { 0.0 };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            raw as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            direction: shape.direction,
            ordering: shape.ordering,
            workers: shape.workers,
            queue_limit: shape.queue_limit,
            counters,
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            read_queue_peak: shape.queue_peaks.0,
            write_queue_peak: shape.queue_peaks.1,
            elapsed,
            stage_times: report.times.clone(),
        }
    }

    /// Frames written (compress) or read (decompress).
    pub fn frames(&self) -> u64 {
        match self.direction {
            Direction::Compress => self.counters.chunks_written,
            Direction::Decompress => self.counters.chunks_read,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

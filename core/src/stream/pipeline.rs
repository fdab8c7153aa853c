//! Pipeline wiring: reader -> workers -> ordered writer.
//!
//! Threads are scoped to one run and named after what they carry, e.g.
//! `RawDataReadThread`, `CompressionDataThread#2`, `ObserverThread`,
//! `CompressedDataWriteThread`.

use std::io::{Read, Write};
use std::sync::Arc;
use std::thread::{self, Scope, ScopedJoinHandle};

use crossbeam::sync::WaitGroup;
use log::{debug, error, info};

use crate::compression::Codec;
use crate::constants::{CHUNK_SIZE, DEFAULT_LEVEL, MAX_CHUNK_SIZE, MAX_LEVEL};
use crate::stream::coordinator::{Coordinator, OrderingMode};
use crate::stream::direction::Direction;
use crate::stream::interrupt::InterruptHandle;
use crate::stream::io::{run_reader, run_writer};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::worker::run_worker;
use crate::telemetry::{RunShape, StageReport, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Raw window size when compressing. Ignored when decompressing.
    pub chunk_size: usize,
    pub queue_limit: usize,
    pub workers: usize,
    pub ordering: OrderingMode,
    /// gzip level used by `compress_file`.
    pub level: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_profile(ParallelismProfile::detect())
    }
}

impl PipelineConfig {
    pub fn from_profile(profile: ParallelismProfile) -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            queue_limit: profile.queue_limit,
            workers: profile.workers,
            ordering: OrderingMode::default(),
            level: DEFAULT_LEVEL,
        }
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(StreamError::Config(format!(
                "chunk size must be within 1..={MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.queue_limit == 0 {
            return Err(StreamError::Config("queue limit must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(StreamError::Config("worker count must be at least 1".into()));
        }
        if self.level > MAX_LEVEL {
            return Err(StreamError::Config(format!(
                "compression level must be within 0..={MAX_LEVEL}, got {}",
                self.level
            )));
        }
        Ok(())
    }
}

/// Marks the run failed if its stage unwinds.
struct PanicGuard<'a> {
    coordinator: &'a Coordinator,
    stage: String,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("[PIPELINE] {} panicked", self.stage);
            self.coordinator
                .fail(StreamError::PipelineError(format!("{} panicked", self.stage)));
        }
    }
}

fn spawn_stage<'scope, 'env, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: String,
    coordinator: &'scope Coordinator,
    body: F,
) -> Option<ScopedJoinHandle<'scope, StageReport>>
where
    F: FnOnce() -> StageReport + Send + 'scope,
{
    let stage = name.clone();
    let spawned = thread::Builder::new().name(name).spawn_scoped(scope, move || {
        let _guard = PanicGuard { coordinator, stage };
        body()
    });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            coordinator.fail(StreamError::PipelineError(format!("failed to start thread: {e}")));
            None
        }
    }
}

/// Run one file-sized stream through the chunk pipeline.
///
/// Returns the merged telemetry on success. On any failure or interrupt the
/// first recorded cause is returned; cleaning up `writer`'s destination is
/// the caller's job.
pub fn run_pipeline<R, W>(
    reader: R,
    writer: W,
    direction: Direction,
    codec: &dyn Codec,
    config: &PipelineConfig,
    interrupt: &InterruptHandle,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read + Send,
    W: Write + Send,
{
    config.validate()?;

    let mut timer = TelemetryTimer::new();
    let coordinator = Arc::new(Coordinator::new(config.queue_limit, config.ordering));
    let _attached = interrupt.attach(&coordinator);

    let policy = direction.policy();
    let window = config.chunk_size;
    let workers = config.workers;

    info!(
        "[PIPELINE] start {direction} ({}): workers={workers}, queue_limit={}, ordering={:?}",
        codec.name(),
        config.queue_limit,
        config.ordering
    );

    let mut total = StageReport::default();

    thread::scope(|scope| {
        let coord: &Coordinator = &coordinator;
        let mut handles = Vec::with_capacity(workers + 3);

        handles.extend(spawn_stage(
            scope,
            format!("{}DataReadThread", direction.initial_state()),
            coord,
            move || run_reader(reader, coord, policy.split, window),
        ));

        let done = WaitGroup::new();
        for i in 0..workers {
            let worker_done = done.clone();
            handles.extend(spawn_stage(
                scope,
                format!("{}DataThread#{i}", direction.routine_name()),
                coord,
                move || run_worker(i, coord, codec, policy, worker_done),
            ));
        }

        handles.extend(spawn_stage(scope, "ObserverThread".into(), coord, move || {
            done.wait();
            debug!("[OBSERVER] all workers done");
            coord.mark_all_workers_done();
            StageReport::default()
        }));

        handles.extend(spawn_stage(
            scope,
            format!("{}DataWriteThread", direction.final_state()),
            coord,
            move || run_writer(writer, coord),
        ));

        for handle in handles {
            match handle.join() {
                Ok(report) => total.merge(&report),
                Err(_) => coord.fail(StreamError::PipelineError("pipeline thread panicked".into())),
            }
        }
    });

    timer.finish();

    if coordinator.is_interrupted() {
        let err = coordinator.take_error().unwrap_or(StreamError::Cancelled);
        info!("[PIPELINE] {direction} aborted: {err}");
        return Err(err);
    }

    let shape = RunShape {
        direction,
        ordering: coordinator.ordering(),
        workers,
        queue_limit: coordinator.queue_limit(),
        queue_peaks: coordinator.high_water(),
    };
    let snapshot = TelemetrySnapshot::from(shape, &total, &timer);
    info!(
        "[PIPELINE] {direction} done: {} chunks, {} -> {} bytes in {:?}",
        total.counters.chunks_read,
        total.counters.bytes_read,
        total.counters.bytes_written,
        snapshot.elapsed
    );
    Ok(snapshot)
}

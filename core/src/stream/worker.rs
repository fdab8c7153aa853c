use std::time::Instant;

use crossbeam::sync::WaitGroup;
use log::{debug, error};

use crate::compression::Codec;
use crate::stream::chunk::Chunk;
use crate::stream::coordinator::Coordinator;
use crate::stream::direction::DirectionPolicy;
use crate::telemetry::StageReport;

/// Single worker loop.
///
/// `done` is this worker's share of the completion group; dropping it on
/// return is what tells the observer this worker will produce nothing more.
pub fn run_worker(
    index: usize,
    coordinator: &Coordinator,
    codec: &dyn Codec,
    policy: DirectionPolicy,
    done: WaitGroup,
) -> StageReport {
    let mut report = StageReport::default();
    debug!("[WORKER-{index}] starting");

    while !coordinator.is_interrupted() {
        let Some(Chunk { id, payload }) = coordinator.dequeue_for_processing() else {
            break;
        };

        let start = Instant::now();
        let output = match (policy.transform)(codec, &payload) {
            Ok(out) => out,
            Err(e) => {
                error!("[WORKER-{index}] {} chunk {id}: {e}", codec.name());
                coordinator.fail(e);
                break;
            }
        };
        report.times.add(policy.stage, start.elapsed());
        report.counters.add_transformed();

        // Parks here until it is this id's turn (turnstile mode).
        if coordinator.enqueue_write(Chunk::new(id, output)).is_err() {
            debug!("[WORKER-{index}] stopped while chunk {id} waited for its turn");
            break;
        }
    }

    debug!("[WORKER-{index}] finished, {} chunks", report.counters.chunks_transformed);
    drop(done);
    report
}

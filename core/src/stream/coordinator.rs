//! Bounded dual-queue coordinator.
//!
//! The read-queue (reader → workers) and the write-queue (workers → writer)
//! each have their own mutex and condition variable. The write side also
//! carries the ordering gate: chunks enter the write-queue strictly by id,
//! whatever order the workers finish in.
//!
//! Lock order: a thread holds at most one queue lock, except `stop()` which
//! takes read then write.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::stream::chunk::Chunk;
use crate::types::StreamError;

/// How `enqueue_write` orders completed chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum OrderingMode {
    /// Only the holder of the next-due id passes; later ids park their worker.
    #[default]
    Turnstile,
    /// Later ids are parked in a bounded map and the worker goes back for more work.
    ///
    /// The map holds at most `queue_limit` chunks on top of the write-queue's
    /// own `queue_limit`, so the write side keeps up to twice the limit.
    ReorderBuffer,
}

/// Cross-thread flags of one run. Every flag moves false → true once.
#[derive(Debug, Default)]
pub struct PipelineState {
    interrupted: AtomicBool,
    read_finished: AtomicBool,
    all_workers_done: AtomicBool,
    terminated: AtomicBool,
    first_error: Mutex<Option<StreamError>>,
}

impl PipelineState {
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn is_read_finished(&self) -> bool {
        self.read_finished.load(Ordering::SeqCst)
    }

    pub fn is_all_workers_done(&self) -> bool {
        self.all_workers_done.load(Ordering::SeqCst)
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Keeps the first cause only; later failures are usually fallout from it.
    fn record(&self, err: StreamError) {
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take_error(&self) -> Option<StreamError> {
        self.first_error.lock().take()
    }
}

#[derive(Debug, Default)]
struct ReadSide {
    queue: VecDeque<Chunk>,
    next_id: u64,
    peak: usize,
}

#[derive(Debug, Default)]
struct WriteSide {
    queue: VecDeque<Chunk>,
    /// Reorder-buffer mode only: completed chunks whose turn has not come.
    pending: BTreeMap<u64, Chunk>,
    next_id: u64,
    peak: usize,
    pending_peak: usize,
}

impl WriteSide {
    fn push(&mut self, chunk: Chunk) {
        self.queue.push_back(chunk);
        self.next_id += 1;
        self.peak = self.peak.max(self.queue.len());
    }

    /// Move consecutive ids from `pending` into the queue while it has room.
    fn release_ready(&mut self, limit: usize) {
        while self.queue.len() < limit {
            match self.pending.remove(&self.next_id) {
                Some(chunk) => self.push(chunk),
                None => break,
            }
        }
    }
}

#[derive(Debug)]
pub struct Coordinator {
    state: PipelineState,
    limit: usize,
    ordering: OrderingMode,

    read: Mutex<ReadSide>,
    read_cv: Condvar,

    write: Mutex<WriteSide>,
    write_cv: Condvar,
}

impl Coordinator {
    pub fn new(limit: usize, ordering: OrderingMode) -> Self {
        Self {
            state: PipelineState::default(),
            limit: limit.max(1),
            ordering,
            read: Mutex::new(ReadSide::default()),
            read_cv: Condvar::new(),
            write: Mutex::new(WriteSide::default()),
            write_cv: Condvar::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn queue_limit(&self) -> usize {
        self.limit
    }

    pub fn ordering(&self) -> OrderingMode {
        self.ordering
    }

    pub fn is_interrupted(&self) -> bool {
        self.state.is_interrupted()
    }

    // ------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------

    /// Append a payload under the next id. Blocks while the read-queue is full.
    pub fn enqueue_read(&self, payload: Bytes) -> Result<u64, StreamError> {
        let mut side = self.read.lock();
        while !self.state.is_terminated() && side.queue.len() >= self.limit {
            self.read_cv.wait(&mut side);
        }
        if self.state.is_terminated() {
            return Err(StreamError::Terminated);
        }

        let id = side.next_id;
        side.next_id += 1;
        side.queue.push_back(Chunk::new(id, payload));
        side.peak = side.peak.max(side.queue.len());

        self.read_cv.notify_all();
        Ok(id)
    }

    /// Next chunk in read order, or `None` once the reader is done and the
    /// queue is drained, or the pipeline was stopped.
    pub fn dequeue_for_processing(&self) -> Option<Chunk> {
        let mut side = self.read.lock();
        while !self.state.is_terminated()
            && !self.state.is_read_finished()
            && side.queue.is_empty()
        {
            self.read_cv.wait(&mut side);
        }

        let chunk = if self.state.is_terminated() {
            None
        } else {
            side.queue.pop_front()
        };

        // A slot opened up (or the stream ended): the reader and the other
        // workers share this condvar, so wake all of them.
        self.read_cv.notify_all();
        chunk
    }

    pub fn mark_read_finished(&self) {
        self.state.read_finished.store(true, Ordering::SeqCst);
        let _side = self.read.lock();
        self.read_cv.notify_all();
    }

    // ------------------------------------------------------------
    // Write side
    // ------------------------------------------------------------

    /// Ordering gate in front of the write-queue.
    pub fn enqueue_write(&self, chunk: Chunk) -> Result<(), StreamError> {
        let mut side = self.write.lock();

        match self.ordering {
            OrderingMode::Turnstile => {
                while !self.state.is_terminated()
                    && (chunk.id != side.next_id || side.queue.len() >= self.limit)
                {
                    self.write_cv.wait(&mut side);
                }
                if self.state.is_terminated() {
                    return Err(StreamError::Terminated);
                }
                side.push(chunk);
            }
            OrderingMode::ReorderBuffer => {
                loop {
                    if self.state.is_terminated() {
                        return Err(StreamError::Terminated);
                    }
                    let admit = if chunk.id == side.next_id {
                        side.queue.len() < self.limit
                    } else {
                        side.pending.len() < self.limit
                    };
                    if admit {
                        break;
                    }
                    self.write_cv.wait(&mut side);
                }
                if chunk.id == side.next_id {
                    side.push(chunk);
                    side.release_ready(self.limit);
                } else {
                    side.pending.insert(chunk.id, chunk);
                    side.pending_peak = side.pending_peak.max(side.pending.len());
                }
            }
        }

        self.write_cv.notify_all();
        Ok(())
    }

    /// Next chunk in id order, or `None` once every worker is done and the
    /// queue is drained, or the pipeline was stopped with nothing queued.
    pub fn dequeue_for_writing(&self) -> Option<Chunk> {
        let mut side = self.write.lock();
        loop {
            side.release_ready(self.limit);
            if let Some(chunk) = side.queue.pop_front() {
                side.release_ready(self.limit);
                self.write_cv.notify_all();
                return Some(chunk);
            }
            if self.state.is_terminated() || self.state.is_all_workers_done() {
                self.write_cv.notify_all();
                return None;
            }
            self.write_cv.wait(&mut side);
        }
    }

    pub fn mark_all_workers_done(&self) {
        self.state.all_workers_done.store(true, Ordering::SeqCst);
        let _side = self.write.lock();
        self.write_cv.notify_all();
    }

    // ------------------------------------------------------------
    // Termination
    // ------------------------------------------------------------

    /// Release every blocked caller on both queues. Idempotent.
    pub fn stop(&self) {
        let _read = self.read.lock();
        let write = self.write.lock();
        self.state.terminated.store(true, Ordering::SeqCst);
        self.write_cv.notify_all();
        drop(write);
        self.read_cv.notify_all();
    }

    /// Abort the run without a recorded cause.
    pub fn interrupt(&self) {
        self.state.interrupted.store(true, Ordering::SeqCst);
        self.stop();
    }

    /// Record `err` as the run's failure (first one wins) and abort.
    pub fn fail(&self, err: StreamError) {
        self.state.record(err);
        self.interrupt();
    }

    pub fn take_error(&self) -> Option<StreamError> {
        self.state.take_error()
    }

    /// Highest occupancy seen on (read-queue, write-queue).
    pub fn high_water(&self) -> (usize, usize) {
        let read = self.read.lock().peak;
        let write = self.write.lock().peak;
        (read, write)
    }

    /// Highest number of chunks parked in the reorder buffer at once.
    pub fn pending_high_water(&self) -> usize {
        self.write.lock().pending_peak
    }

    /// Chunks parked in the reorder buffer right now.
    pub fn pending_len(&self) -> usize {
        self.write.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn payload(b: u8) -> Bytes {
        Bytes::from(vec![b; 4])
    }

    #[test]
    fn ids_are_assigned_in_enqueue_order() {
        let c = Coordinator::new(5, OrderingMode::Turnstile);
        assert_eq!(c.enqueue_read(payload(0)).unwrap(), 0);
        assert_eq!(c.enqueue_read(payload(1)).unwrap(), 1);
        assert_eq!(c.dequeue_for_processing().unwrap().id, 0);
        assert_eq!(c.dequeue_for_processing().unwrap().id, 1);
    }

    #[test]
    fn dequeue_returns_none_after_read_finished() {
        let c = Coordinator::new(5, OrderingMode::Turnstile);
        c.enqueue_read(payload(9)).unwrap();
        c.mark_read_finished();
        assert!(c.dequeue_for_processing().is_some());
        assert!(c.dequeue_for_processing().is_none());
    }

    #[test]
    fn full_read_queue_blocks_until_consumed() {
        let c = Arc::new(Coordinator::new(2, OrderingMode::Turnstile));
        c.enqueue_read(payload(0)).unwrap();
        c.enqueue_read(payload(1)).unwrap();

        let producer = {
            let c = c.clone();
            thread::spawn(move || c.enqueue_read(payload(2)))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!producer.is_finished());

        c.dequeue_for_processing().unwrap();
        assert_eq!(producer.join().unwrap().unwrap(), 2);
        assert_eq!(c.high_water().0, 2);
    }

    #[test]
    fn turnstile_parks_later_ids() {
        let c = Arc::new(Coordinator::new(5, OrderingMode::Turnstile));
        let late = {
            let c = c.clone();
            thread::spawn(move || c.enqueue_write(Chunk::new(1, payload(1))))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!late.is_finished());

        c.enqueue_write(Chunk::new(0, payload(0))).unwrap();
        late.join().unwrap().unwrap();

        c.mark_all_workers_done();
        assert_eq!(c.dequeue_for_writing().unwrap().id, 0);
        assert_eq!(c.dequeue_for_writing().unwrap().id, 1);
        assert!(c.dequeue_for_writing().is_none());
    }

    #[test]
    fn reorder_buffer_does_not_block_later_ids() {
        let c = Coordinator::new(5, OrderingMode::ReorderBuffer);
        c.enqueue_write(Chunk::new(2, payload(2))).unwrap();
        c.enqueue_write(Chunk::new(1, payload(1))).unwrap();
        assert_eq!(c.pending_len(), 2);

        c.enqueue_write(Chunk::new(0, payload(0))).unwrap();
        assert_eq!(c.pending_len(), 0);

        c.mark_all_workers_done();
        let ids: Vec<u64> = std::iter::from_fn(|| c.dequeue_for_writing()).map(|ch| ch.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn reorder_buffer_respects_queue_limit() {
        let c = Coordinator::new(2, OrderingMode::ReorderBuffer);
        c.enqueue_write(Chunk::new(1, payload(1))).unwrap();
        c.enqueue_write(Chunk::new(2, payload(2))).unwrap();
        c.enqueue_write(Chunk::new(0, payload(0))).unwrap();

        // 0 and 1 released, 2 still waits for room.
        assert_eq!(c.pending_len(), 1);
        assert_eq!(c.dequeue_for_writing().unwrap().id, 0);
        assert_eq!(c.pending_len(), 0);
        assert!(c.high_water().1 <= 2);
    }

    #[test]
    fn reorder_buffer_holds_at_most_twice_the_limit() {
        let c = Arc::new(Coordinator::new(2, OrderingMode::ReorderBuffer));
        c.enqueue_write(Chunk::new(2, payload(2))).unwrap();
        c.enqueue_write(Chunk::new(3, payload(3))).unwrap();

        // Map is full: a third later id waits.
        let late = {
            let c = c.clone();
            thread::spawn(move || c.enqueue_write(Chunk::new(4, payload(4))))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!late.is_finished());

        // The next-due ids are still admitted; 0 and 1 fill the write-queue.
        c.enqueue_write(Chunk::new(0, payload(0))).unwrap();
        c.enqueue_write(Chunk::new(1, payload(1))).unwrap();
        assert_eq!(c.pending_len(), 2);
        assert_eq!(c.high_water().1, 2);
        assert!(!late.is_finished());

        // Draining one slot releases 2, which frees room for 4 in the map.
        assert_eq!(c.dequeue_for_writing().unwrap().id, 0);
        late.join().unwrap().unwrap();
        assert!(c.pending_high_water() <= 2);
        assert!(c.high_water().1 <= 2);
    }

    #[test]
    fn stop_releases_every_blocked_caller() {
        let c = Arc::new(Coordinator::new(1, OrderingMode::Turnstile));
        c.enqueue_read(payload(0)).unwrap();

        let producer = {
            let c = c.clone();
            thread::spawn(move || c.enqueue_read(payload(1)))
        };
        let gated = {
            let c = c.clone();
            thread::spawn(move || c.enqueue_write(Chunk::new(3, payload(3))))
        };
        let writer = {
            let c = c.clone();
            thread::spawn(move || c.dequeue_for_writing())
        };
        thread::sleep(Duration::from_millis(50));

        c.stop();
        assert!(matches!(producer.join().unwrap(), Err(StreamError::Terminated)));
        assert!(matches!(gated.join().unwrap(), Err(StreamError::Terminated)));
        assert!(writer.join().unwrap().is_none());
        assert!(c.dequeue_for_processing().is_none());
    }

    #[test]
    fn first_failure_wins() {
        let c = Coordinator::new(5, OrderingMode::Turnstile);
        c.fail(StreamError::PipelineError("first".into()));
        c.fail(StreamError::Cancelled);
        assert!(c.is_interrupted());
        assert!(matches!(c.take_error(), Some(StreamError::PipelineError(m)) if m == "first"));
    }
}

//! Worker-count and queue-depth resolution.

use log::debug;

use crate::constants::QUEUE_LIMIT;

/// How many workers a run starts and how deep each queue may grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelismProfile {
    pub workers: usize,
    pub queue_limit: usize,
}

impl ParallelismProfile {
    pub fn new(workers: usize, queue_limit: usize) -> Self {
        Self { workers, queue_limit }
    }

    /// One worker per logical processor, default queue depth.
    pub fn detect() -> Self {
        let workers = num_cpus::get().max(1);
        debug!("[PROFILE] workers={workers}, queue_limit={QUEUE_LIMIT}");
        Self { workers, queue_limit: QUEUE_LIMIT }
    }

    /// Keep the detected queue depth but pin the worker count.
    pub fn with_workers(self, workers: usize) -> Self {
        Self { workers, ..self }
    }
}

impl Default for ParallelismProfile {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_has_at_least_one_worker() {
        let p = ParallelismProfile::detect();
        assert!(p.workers >= 1);
        assert_eq!(p.queue_limit, QUEUE_LIMIT);
    }

    #[test]
    fn with_workers_overrides_count_only() {
        let p = ParallelismProfile::new(8, 3).with_workers(2);
        assert_eq!(p, ParallelismProfile::new(2, 3));
    }
}

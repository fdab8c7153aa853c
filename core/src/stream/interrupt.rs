use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::stream::coordinator::Coordinator;
use crate::types::StreamError;

/// Cloneable cancellation handle handed to signal handlers.
///
/// The flag is monotonic: once `interrupt()` has been called, every run
/// started with this handle fails with `StreamError::Cancelled`, including
/// runs that start afterwards.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    inner: Arc<InterruptInner>,
}

#[derive(Debug, Default)]
struct InterruptInner {
    requested: AtomicBool,
    active: Mutex<Option<Arc<Coordinator>>>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn interrupt(&self) {
        if self.inner.requested.swap(true, Ordering::SeqCst) {
            debug!("[INTERRUPT] repeated request ignored");
        } else {
            warn!("[INTERRUPT] cancellation requested");
        }
        if let Some(coordinator) = self.inner.active.lock().as_ref() {
            coordinator.fail(StreamError::Cancelled);
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Route interrupts to `coordinator` until the guard drops.
    pub(crate) fn attach(&self, coordinator: &Arc<Coordinator>) -> AttachGuard<'_> {
        let mut active = self.inner.active.lock();
        *active = Some(coordinator.clone());
        if self.is_interrupted() {
            coordinator.fail(StreamError::Cancelled);
        }
        AttachGuard { handle: self }
    }
}

pub(crate) struct AttachGuard<'a> {
    handle: &'a InterruptHandle,
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        self.handle.inner.active.lock().take();
    }
}

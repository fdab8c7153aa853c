//! Single-instance guard: an exclusive advisory lock on a well-known file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use log::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join("chunkzip.lock")
}

/// Held for the lifetime of the process run; the lock goes with the handle.
#[derive(Debug)]
pub struct InstanceGuard {
    file: File,
}

impl InstanceGuard {
    /// Poll for the lock for up to `wait`. `Ok(None)` means another process
    /// still holds it.
    pub fn acquire(path: &Path, wait: Duration) -> io::Result<Option<Self>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + wait;
        loop {
            // Trait-qualified: newer std has inherent `File` lock methods.
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    debug!("[INSTANCE] lock acquired at {}", path.display());
                    return Ok(Some(Self { file }));
                }
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

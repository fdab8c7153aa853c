//! Reader / writer stages and chunking helpers.

use std::io::{self, Read, Write};
use std::time::Instant;

use bytes::Bytes;
use log::{debug, error};

use crate::constants::FRAME_HEADER_LEN;
use crate::stream::coordinator::Coordinator;
use crate::stream::direction::SplitFn;
use crate::stream::framing::{parse_frame_header, FrameError};
use crate::telemetry::{Stage, StageReport};
use crate::types::StreamError;

/// Read until `buf` is full or the input ends. Returns the bytes read.
pub fn read_fully(r: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

/// Next fixed window of at most `len` bytes; the last one may be shorter.
pub fn read_window(r: &mut dyn Read, len: usize) -> Result<Option<Bytes>, StreamError> {
    let mut buf = vec![0u8; len];
    let n = read_fully(r, &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some(Bytes::from(buf)))
}

/// Next whole frame (prefix + body), located by its stamped length.
///
/// End of input exactly on a frame boundary is the clean end of stream.
pub fn read_frame(r: &mut dyn Read) -> Result<Option<Bytes>, StreamError> {
    let mut prefix = [0u8; FRAME_HEADER_LEN];
    let n = read_fully(r, &mut prefix)?;
    if n == 0 {
        return Ok(None);
    }
    if n < FRAME_HEADER_LEN {
        return Err(FrameError::TruncatedHeader { have: n }.into());
    }

    let header = parse_frame_header(&prefix)?;
    let total = header.frame_len as usize;

    let mut frame = vec![0u8; total];
    frame[..FRAME_HEADER_LEN].copy_from_slice(&prefix);
    let body = read_fully(r, &mut frame[FRAME_HEADER_LEN..])?;
    if body < header.body_len() {
        return Err(FrameError::TruncatedBody {
            expected: total,
            actual: FRAME_HEADER_LEN + body,
        }
        .into());
    }

    Ok(Some(Bytes::from(frame)))
}

// ================= Reader stage =================

pub fn run_reader<R: Read>(
    mut reader: R,
    coordinator: &Coordinator,
    split: SplitFn,
    window: usize,
) -> StageReport {
    let mut report = StageReport::default();

    while !coordinator.is_interrupted() {
        let start = Instant::now();
        match split(&mut reader, window) {
            Ok(Some(payload)) => {
                report.times.add(Stage::Read, start.elapsed());
                let len = payload.len();
                match coordinator.enqueue_read(payload) {
                    Ok(id) => {
                        debug!("[READER] chunk {} queued ({} bytes)", id, len);
                        report.counters.add_read(len);
                    }
                    Err(_) => {
                        debug!("[READER] stopped while queueing");
                        break;
                    }
                }
            }
            Ok(None) => {
                debug!("[READER] EOF after {} chunks", report.counters.chunks_read);
                break;
            }
            Err(e) => {
                error!("[READER] {}", e);
                coordinator.fail(e);
                break;
            }
        }
    }

    coordinator.mark_read_finished();
    report
}

// ================= Writer stage =================

pub fn run_writer<W: Write>(mut writer: W, coordinator: &Coordinator) -> StageReport {
    let mut report = StageReport::default();

    let result = (|| -> Result<(), StreamError> {
        while !coordinator.is_interrupted() {
            let Some(chunk) = coordinator.dequeue_for_writing() else {
                break;
            };
            let start = Instant::now();
            writer.write_all(&chunk.payload)?;
            report.times.add(Stage::Write, start.elapsed());
            report.counters.add_written(chunk.len());
            debug!("[WRITER] chunk {} written ({} bytes)", chunk.id, chunk.len());
        }
        writer.flush()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            debug!("[WRITER] finished, {} chunks", report.counters.chunks_written);
            coordinator.stop();
        }
        Err(e) => {
            error!("[WRITER] {}", e);
            coordinator.fail(e);
        }
    }
    report
}

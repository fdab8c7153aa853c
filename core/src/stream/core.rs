//! File-level API.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, warn};

use crate::compression::{Codec, GzipCodec};
use crate::stream::direction::Direction;
use crate::stream::interrupt::InterruptHandle;
use crate::stream::pipeline::{run_pipeline, PipelineConfig};
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

const IO_BUFFER: usize = 64 * 1024;

/// Compress `input` into a multi-member gzip archive at `output`.
pub fn compress_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
    interrupt: &InterruptHandle,
) -> Result<TelemetrySnapshot, StreamError> {
    let codec = GzipCodec::new(config.level)?;
    process_file_with_codec(Direction::Compress, input, output, &codec, config, interrupt)
}

/// Restore the file compressed by `compress_file`.
pub fn decompress_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
    interrupt: &InterruptHandle,
) -> Result<TelemetrySnapshot, StreamError> {
    let codec = GzipCodec::new(config.level)?;
    process_file_with_codec(Direction::Decompress, input, output, &codec, config, interrupt)
}

/// File plumbing around `run_pipeline`. The output is created (truncated)
/// only after the input opened, and removed again on any failure.
pub fn process_file_with_codec(
    direction: Direction,
    input: &Path,
    output: &Path,
    codec: &dyn Codec,
    config: &PipelineConfig,
    interrupt: &InterruptHandle,
) -> Result<TelemetrySnapshot, StreamError> {
    config.validate()?;

    let reader = BufReader::with_capacity(IO_BUFFER, File::open(input)?);
    let writer = BufWriter::with_capacity(IO_BUFFER, File::create(output)?);

    debug!("[PIPELINE] {} -> {}", input.display(), output.display());

    run_to_output(reader, writer, output, direction, codec, config, interrupt)
}

/// `run_pipeline` into a sink backed by the file at `output`; the file is
/// removed if the run fails.
pub fn run_to_output<R, W>(
    reader: R,
    writer: W,
    output: &Path,
    direction: Direction,
    codec: &dyn Codec,
    config: &PipelineConfig,
    interrupt: &InterruptHandle,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read + Send,
    W: Write + Send,
{
    let result = run_pipeline(reader, writer, direction, codec, config, interrupt);
    if result.is_err() {
        remove_partial(output);
    }
    result
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("[PIPELINE] removed partial output {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("[PIPELINE] could not remove {}: {e}", path.display()),
    }
}

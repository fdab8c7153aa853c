//! chunkzip: compress or decompress one large file across all cores.
//!
//! Usage: chunkzip compress|decompress SOURCE DESTINATION [OPTIONS]

mod instance;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, LevelFilter};

use chunkzip_core::constants::{CHUNK_SIZE, DEFAULT_LEVEL, INSTANCE_LOCK_WAIT_MS};
use chunkzip_core::stream::{
    compress_file, decompress_file, Direction, InterruptHandle, OrderingMode, ParallelismProfile,
    PipelineConfig,
};
use chunkzip_core::types::StreamError;
use chunkzip_core::utils::{format_bytes, format_elapsed};
use chunkzip_core::validation::{self, ValidationError};

use crate::instance::{default_lock_path, InstanceGuard};

#[derive(Debug, Parser)]
#[command(name = "chunkzip", version, about = "Parallel chunked gzip compressor")]
struct Cli {
    /// compress|decompress SOURCE DESTINATION
    #[arg(value_name = "ARGS", num_args = 0..)]
    args: Vec<String>,

    /// Worker threads (default: one per logical CPU).
    #[arg(short = 't', long, value_name = "N")]
    threads: Option<usize>,

    /// gzip level, 0-9.
    #[arg(short = 'l', long, default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Raw bytes per chunk when compressing.
    #[arg(long, value_name = "BYTES", default_value_t = CHUNK_SIZE)]
    chunk_size: usize,

    /// Park out-of-order results in a bounded buffer instead of blocking workers.
    #[arg(long)]
    reorder_buffer: bool,

    /// Print the run telemetry as JSON instead of the text summary.
    #[arg(long)]
    json: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,

    #[arg(long, value_name = "PATH", hide = true)]
    lock_file: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut profile = ParallelismProfile::detect();
        if let Some(n) = self.threads {
            profile = profile.with_workers(n);
        }
        PipelineConfig {
            chunk_size: self.chunk_size,
            level: self.level,
            ordering: if self.reorder_buffer {
                OrderingMode::ReorderBuffer
            } else {
                OrderingMode::Turnstile
            },
            ..PipelineConfig::from_profile(profile)
        }
    }
}

fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if cli.quiet {
        builder.filter_level(LevelFilter::Error);
    }
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };
    init_logging(&cli);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let cancelled = e
                .downcast_ref::<StreamError>()
                .is_some_and(StreamError::is_cancelled);
            if cancelled {
                println!("Interrupted");
            } else if e.is::<StreamError>() || e.is::<ValidationError>() {
                println!("Error: {e}");
            } else {
                println!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let lock_path = cli.lock_file.clone().unwrap_or_else(default_lock_path);
    let wait = Duration::from_millis(INSTANCE_LOCK_WAIT_MS);
    let Some(_instance) = InstanceGuard::acquire(&lock_path, wait)
        .with_context(|| format!("cannot open lock file {}", lock_path.display()))?
    else {
        println!("Another application instance is running. Terminating..");
        return Ok(ExitCode::FAILURE);
    };

    let interrupt = InterruptHandle::new();
    {
        let handle = interrupt.clone();
        ctrlc::set_handler(move || {
            println!("Interruption..");
            handle.interrupt();
        })
        .context("cannot install Ctrl-C handler")?;
    }

    let direction = validation::check_args(&cli.args)?;
    let (input, output) = match cli.args.as_slice() {
        [_, input, output] => (PathBuf::from(input), PathBuf::from(output)),
        _ => return Err(ValidationError::ArgumentCount.into()),
    };

    let config = cli.pipeline_config();
    debug!("[CLI] {config:?}");
    println!("{}..", direction.routine_name());

    let snapshot = match direction {
        Direction::Compress => compress_file(&input, &output, &config, &interrupt)?,
        Direction::Decompress => decompress_file(&input, &output, &config, &interrupt)?,
    };

    if cli.json {
        println!("{}", snapshot.to_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} routine accomplished.", direction.routine_name());
    println!("CPU threads utilized: {}.", snapshot.workers);
    println!("Time elapsed: {}", format_elapsed(snapshot.elapsed));
    info!(
        "[CLI] {} frames, {} -> {}, ratio {:.3}",
        snapshot.frames(),
        format_bytes(snapshot.counters.bytes_read),
        format_bytes(snapshot.counters.bytes_written),
        snapshot.compression_ratio
    );
    Ok(ExitCode::SUCCESS)
}

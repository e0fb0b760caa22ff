//! myzip: compress or uncompress files in place.
//!
//! ```bash
//! # notes.txt -> notes.txt.gz, removing notes.txt
//! myzip notes.txt
//!
//! # notes.txt.gz -> notes.txt, keeping the archive, with progress on stderr
//! myzip -k -v notes.txt.gz
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zstream_core::file::{deflate_file, inflate_file, plan, FileAction};
use zstream_core::ZStreamConfig;

#[derive(Parser, Debug)]
#[command(name = "myzip")]
#[command(version)]
#[command(about = "Compress FILE to FILE.gz, or uncompress FILE.gz to FILE", long_about = None)]
struct Args {
    /// Keep input files instead of deleting them
    #[arg(short, long)]
    keep: bool,

    /// Report progress messages to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Deflate level (0-9)
    #[arg(short, long, default_value_t = 6)]
    level: u32,

    /// Block size for reads and writes, in bytes
    #[arg(long, default_value_t = zstream_core::constants::DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Input file(s) to compress/uncompress
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = ZStreamConfig::new(Some(args.buffer_size), Some(args.level));
    config.validate()?;

    for src in &args.files {
        info!(file = %src.display(), "consider file");
        let report = match plan(src) {
            FileAction::Compress { dst } => deflate_file(src, &dst, args.keep, &config)
                .with_context(|| format!("compress [{}] -> [{}]", src.display(), dst.display()))?,
            FileAction::Uncompress { dst } => inflate_file(src, &dst, args.keep, &config)
                .with_context(|| format!("uncompress [{}] -> [{}]", src.display(), dst.display()))?,
        };
        info!(file = %src.display(), bytes_in = report.bytes_in, bytes_out = report.bytes_out, "done");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("myzip: {e:#}");
            ExitCode::FAILURE
        }
    }
}

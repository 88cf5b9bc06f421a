//! Driver process entry point: the pipe transport's child.
//!
//! With `--cmd` it serves the line protocol on stdin/stdout; stdout is
//! reserved for protocol replies, so logs go to stderr.

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use driver_harness::pipe::run_command_loop;
use driver_harness::producer::Producer;

/// Synthetic measurement driver
#[derive(Parser)]
#[command(name = "driver")]
#[command(about = "Regenerates a synthetic measurement and serves reads over stdio")]
#[command(version)]
struct Cli {
    /// Serve the line command protocol on stdin/stdout
    #[arg(short = 'r', long = "cmd")]
    cmd: bool,

    /// Update interval in milliseconds
    #[arg(short = 'd', long, default_value_t = 50)]
    interval_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("driver_harness=info".parse()?))
        .init();

    let cli = Cli::parse();

    let producer = Producer::new();
    producer.connect(Duration::from_millis(cli.interval_ms));

    if cli.cmd {
        let stdin = io::stdin();
        let stdout = io::stdout();
        run_command_loop(&producer, stdin.lock(), stdout.lock())?;
    }

    producer.disconnect();
    Ok(())
}

//! Harness CLI: run one latency session over a selected transport.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use driver_harness::config::{HarnessConfig, RunMode};
use driver_harness::session::run_session;
use driver_harness::transport::create_transport;

/// Driver result transport harness
#[derive(Parser)]
#[command(name = "driver-harness")]
#[command(about = "Measures end-to-end driver read latency across transports")]
#[command(version)]
struct Cli {
    /// Transport/encoding to exercise
    #[arg(short = 'r', long = "mode", value_enum, default_value_t = RunMode::Json)]
    mode: RunMode,

    /// Driver update interval in milliseconds
    #[arg(short = 'd', long, default_value_t = 50)]
    update_interval_ms: u64,

    /// Delay between reads in milliseconds
    #[arg(long, default_value_t = 100)]
    read_delay_ms: u64,

    /// Stop once the observed iteration reaches this value
    #[arg(short = 'i', long, default_value_t = 50)]
    iterations: i64,

    /// Path to the driver binary (pipe modes)
    #[arg(long)]
    driver_bin: Option<PathBuf>,

    /// Path to the driver shared library (dynamic mode)
    #[arg(long)]
    driver_lib: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("driver_harness=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = HarnessConfig::default().with_mode(cli.mode);
    config.update_interval_ms = cli.update_interval_ms;
    config.read_delay_ms = cli.read_delay_ms;
    config.target_iteration = cli.iterations;
    if let Some(driver_bin) = cli.driver_bin {
        config.driver_bin = driver_bin;
    }
    if let Some(driver_lib) = cli.driver_lib {
        config.driver_lib = driver_lib;
    }

    tracing::info!(
        mode = ?config.mode,
        update_interval_ms = config.update_interval_ms,
        read_delay_ms = config.read_delay_ms,
        target_iteration = config.target_iteration,
        "starting session"
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let mut transport = create_transport(&config);
    let report = run_session(transport.as_mut(), &config, shutdown_rx).await?;

    println!("{}", report.summary);
    Ok(())
}

//! The consumer's driving loop.
//!
//! One session runs `connect → run → read × N → disconnect` against a
//! single transport, feeding each read's round-trip duration into a
//! [`LatencyTracker`]. Latency is accounted the same way for every
//! transport: the time between the producer stamping the read timestamp and
//! the decoded snapshot arriving here.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::sleep;

use crate::config::HarnessConfig;
use crate::latency::{LatencySummary, LatencyTracker};
use crate::record::{now_nanos, DriverResult};
use crate::transport::{DriverTransport, TransportError};

/// A fatal session failure. Nothing is retried; the error carries how many
/// reads completed before the abort.
#[derive(Debug, Error)]
#[error("session aborted after {completed} completed reads: {source}")]
pub struct SessionError {
    #[source]
    pub source: TransportError,
    pub completed: u64,
}

/// Outcome of a completed session.
#[derive(Debug)]
pub struct SessionReport {
    pub summary: LatencySummary,
    /// The last decoded record, if any read completed.
    pub last: Option<DriverResult>,
}

/// Run one full session over the given transport.
///
/// The loop stops when an observed iteration reaches the configured target
/// or when the shutdown channel fires; between reads it sleeps for the
/// configured read delay.
pub async fn run_session(
    transport: &mut dyn DriverTransport,
    config: &HarnessConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<SessionReport, SessionError> {
    let fail = |source: TransportError, completed: u64| SessionError { source, completed };

    transport
        .connect(config.update_interval())
        .await
        .map_err(|e| fail(e, 0))?;
    transport.run().await.map_err(|e| fail(e, 0))?;

    let mut tracker = LatencyTracker::new();
    let mut completed: u64 = 0;
    let mut last = None;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            tracing::info!("session received shutdown signal");
            break;
        }

        let record = match transport.read().await {
            Ok(record) => record,
            Err(source) => {
                let _ = transport.disconnect().await;
                return Err(fail(source, completed));
            }
        };

        let latency =
            Duration::from_nanos(now_nanos().saturating_sub(record.read_timestamp).max(0) as u64);
        tracker.record(latency);
        completed += 1;
        last = Some(record);

        tracing::debug!(
            iteration = record.iteration,
            value = record.value,
            latency_us = latency.as_micros() as u64,
            "read completed"
        );

        if record.iteration >= config.target_iteration {
            break;
        }
        sleep(config.read_delay()).await;
    }

    transport
        .disconnect()
        .await
        .map_err(|e| fail(e, completed))?;

    Ok(SessionReport {
        summary: tracker.summary(),
        last,
    })
}

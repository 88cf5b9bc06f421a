//! In-process transport: producer and consumer share an address space.
//!
//! A read is a direct synchronous call with no encoding step; the measured
//! latency is purely the stamping and copy cost, which makes this the
//! baseline the other transports are compared against. Latency accounting
//! is identical to the other variants.

use std::time::Duration;

use async_trait::async_trait;

use crate::producer::Producer;
use crate::record::DriverResult;

use super::{DriverTransport, TransportMode, TransportResult};

/// Owns a [`Producer`] directly; reads never cross a boundary.
pub struct EmbeddedTransport {
    producer: Producer,
}

impl EmbeddedTransport {
    pub fn new() -> Self {
        Self::with_producer(Producer::new())
    }

    /// Wrap an existing producer, e.g. one with a custom value source.
    pub fn with_producer(producer: Producer) -> Self {
        Self { producer }
    }
}

impl Default for EmbeddedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverTransport for EmbeddedTransport {
    async fn connect(&mut self, interval: Duration) -> TransportResult<()> {
        self.producer.connect(interval);
        tracing::debug!("embedded transport connected");
        Ok(())
    }

    async fn run(&mut self) -> TransportResult<()> {
        self.producer.start();
        Ok(())
    }

    async fn read(&mut self) -> TransportResult<DriverResult> {
        Ok(self.producer.read())
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.producer.disconnect();
        tracing::debug!("embedded transport disconnected");
        Ok(())
    }

    fn mode(&self) -> TransportMode {
        TransportMode::Embedded
    }
}

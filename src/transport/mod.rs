//! Consumer-side transports for reading driver results.
//!
//! Three mechanisms deliver the same logical record with identical
//! semantics and identical latency accounting:
//!
//! - **Embedded**: producer and consumer share an address space; a read is
//!   a direct call.
//! - **PipeProcess**: the driver runs as a child process behind a
//!   line-oriented stdin/stdout protocol, with one of three wire formats.
//! - **DynamicLibrary**: the driver's entry points are resolved by symbol
//!   name from a shared library and invoked in-process.
//!
//! Every variant implements [`DriverTransport`]; mechanism-specific types
//! (child handles, library handles) stay inside their module.

mod dynlib;
mod embedded;
mod pipe;

pub use dynlib::DynLibTransport;
pub use embedded::EmbeddedTransport;
pub use pipe::PipeTransport;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::codec::CodecError;
use crate::config::{HarnessConfig, RunMode};
use crate::record::DriverResult;

/// Which mechanism a transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Embedded,
    PipeProcess,
    DynamicLibrary,
}

/// Transport failures. All of these are fatal to the session; the harness
/// aborts the run rather than retrying.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn driver process: {0}")]
    ProcessSpawn(#[source] std::io::Error),

    #[error("driver stream I/O error: {0}")]
    StreamIo(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    #[error("failed to open driver library: {0}")]
    LibraryOpen(#[source] libloading::Error),

    #[error("failed to resolve symbol `{symbol}`: {source}")]
    SymbolResolution {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("transport not connected")]
    NotConnected,
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One interchangeable read path from a producer to the consumer.
///
/// The session drives `connect → run → read × N → disconnect`; a transport
/// only ever hands out record snapshots, never a live reference across its
/// boundary.
#[async_trait]
pub trait DriverTransport: Send {
    /// Establish the transport and set the producer's regeneration interval.
    async fn connect(&mut self, interval: Duration) -> TransportResult<()>;

    /// Start the producer's regeneration loop.
    async fn run(&mut self) -> TransportResult<()>;

    /// Perform one read: the producer stamps the read timestamp, then the
    /// snapshot travels back over this transport.
    async fn read(&mut self) -> TransportResult<DriverResult>;

    /// Stop the producer and tear the transport down.
    async fn disconnect(&mut self) -> TransportResult<()>;

    fn mode(&self) -> TransportMode;
}

/// Build the transport selected by the configuration.
pub fn create_transport(config: &HarnessConfig) -> Box<dyn DriverTransport> {
    match config.mode {
        RunMode::Embedded => Box::new(EmbeddedTransport::new()),
        RunMode::Dynamic => Box::new(DynLibTransport::new(config.driver_lib.clone())),
        RunMode::Json | RunMode::Bin | RunMode::Str => {
            // wire_format() is Some for exactly these modes.
            let format = config.mode.wire_format().unwrap_or(crate::codec::WireFormat::Json);
            Box::new(PipeTransport::new(config.driver_bin.clone(), format))
        }
    }
}

//! Driver result transport harness.
//!
//! A synthetic driver periodically regenerates a timestamped measurement
//! record; a consumer reads the latest record through one of three
//! interchangeable transports, accounting end-to-end read latency
//! identically for each:
//!
//! - **Embedded**: producer and consumer share an address space
//! - **Pipe process**: the driver runs as a child process behind a
//!   line-oriented stdin/stdout protocol
//! - **Dynamic library**: the driver's exported entry points are resolved
//!   by symbol name from a shared library at runtime
//!
//! The same record travels as a fixed 32-byte little-endian binary frame, a
//! JSON object, or a space-delimited text line; see [`codec`].
//!
//! ## Components
//!
//! - **record**: the shared four-field result record
//! - **codec**: the three wire representations and their error taxonomy
//! - **producer**: the record slot plus its cancellable regeneration loop
//! - **transport**: the three read paths behind one trait
//! - **latency**: per-read round-trip accumulation and session summaries
//! - **session**: the `connect → run → read × N → disconnect` driving loop
//! - **pipe** / **ffi**: the producer-side pipe protocol and the C-ABI
//!   exports backing the dynamic-library transport

pub mod codec;
pub mod config;
pub mod ffi;
pub mod latency;
pub mod pipe;
pub mod producer;
pub mod record;
pub mod session;
pub mod transport;

pub use codec::{CodecError, WireFormat};
pub use config::{HarnessConfig, RunMode};
pub use latency::{EmptySampleSetError, LatencySummary, LatencyTracker};
pub use producer::Producer;
pub use record::{DriverResult, BINARY_FRAME_LEN};
pub use session::{run_session, SessionError, SessionReport};
pub use transport::{
    create_transport, DriverTransport, DynLibTransport, EmbeddedTransport, PipeTransport,
    TransportError, TransportMode,
};

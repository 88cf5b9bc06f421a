//! Dynamic-library transport: driver entry points resolved by symbol name.
//!
//! The consumer loads the driver's shared library at runtime and calls the
//! four exported entry points (`Connect`, `Disconnect`, `Run`, `Read`) as
//! ordinary functions; no process is spawned. Loading fails the session if
//! the library cannot be opened or any symbol is missing. Library handle
//! types never leave this module.

use std::ffi::CString;
use std::os::raw::c_char;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use libloading::{Library, Symbol};

use crate::record::DriverResult;

use super::{DriverTransport, TransportError, TransportMode, TransportResult};

type ConnectFn = unsafe extern "C" fn(i64);
type DisconnectFn = unsafe extern "C" fn();
type RunFn = unsafe extern "C" fn();
type ReadFn = unsafe extern "C" fn(*const c_char) -> DriverResult;

/// Calls the driver through symbols of a runtime-loaded shared library.
pub struct DynLibTransport {
    path: PathBuf,
    lib: Option<Library>,
    /// Optional format name handed to `Read` as its side-channel argument.
    /// String marshalling across the boundary is unreliable in some hosts,
    /// so the returned record never depends on it; `None` passes a null
    /// pointer.
    read_mode: Option<CString>,
}

impl DynLibTransport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lib: None,
            read_mode: None,
        }
    }

    /// Request a side-channel dump in the given format on every read.
    pub fn with_read_mode(mut self, mode: &str) -> Self {
        self.read_mode = CString::new(mode).ok();
        self
    }

    fn symbol<T>(&self, name: &'static str) -> TransportResult<Symbol<'_, T>> {
        let lib = self.lib.as_ref().ok_or(TransportError::NotConnected)?;
        // Safety: the symbol types mirror the driver's exported C ABI.
        unsafe { lib.get(name.as_bytes()) }
            .map_err(|source| TransportError::SymbolResolution { symbol: name, source })
    }
}

#[async_trait]
impl DriverTransport for DynLibTransport {
    async fn connect(&mut self, interval: Duration) -> TransportResult<()> {
        // Safety: the path is expected to name the driver library built from
        // this crate's cdylib target, whose initializers are benign.
        let lib = unsafe { Library::new(&self.path) }.map_err(TransportError::LibraryOpen)?;
        self.lib = Some(lib);

        // Resolve every entry point up front so a missing symbol fails the
        // session at connect time, not mid-run.
        self.symbol::<DisconnectFn>("Disconnect")?;
        self.symbol::<RunFn>("Run")?;
        self.symbol::<ReadFn>("Read")?;
        let connect = self.symbol::<ConnectFn>("Connect")?;

        let nanos = i64::try_from(interval.as_nanos()).unwrap_or(i64::MAX);
        unsafe { connect(nanos) };
        tracing::info!(library = %self.path.display(), "driver library loaded");
        Ok(())
    }

    async fn run(&mut self) -> TransportResult<()> {
        let run = self.symbol::<RunFn>("Run")?;
        unsafe { run() };
        Ok(())
    }

    async fn read(&mut self) -> TransportResult<DriverResult> {
        let read = self.symbol::<ReadFn>("Read")?;
        let mode = self
            .read_mode
            .as_ref()
            .map_or(std::ptr::null(), |m| m.as_ptr());
        Ok(unsafe { read(mode) })
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        if self.lib.is_some() {
            let disconnect = self.symbol::<DisconnectFn>("Disconnect")?;
            unsafe { disconnect() };
            self.lib = None;
            tracing::info!("driver library unloaded");
        }
        Ok(())
    }

    fn mode(&self) -> TransportMode {
        TransportMode::DynamicLibrary
    }
}

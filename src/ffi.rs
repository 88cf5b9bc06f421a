//! C-ABI surface exported from the shared library build.
//!
//! The symbol contract carries no handle argument, so this shim owns the one
//! process-global [`Producer`] in the library. Nothing outside this module
//! touches that global.

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::OnceLock;
use std::time::Duration;

use crate::codec::{self, WireFormat};
use crate::producer::Producer;
use crate::record::DriverResult;

fn global_producer() -> &'static Producer {
    static PRODUCER: OnceLock<Producer> = OnceLock::new();
    PRODUCER.get_or_init(Producer::new)
}

/// Set the regeneration interval, given in nanoseconds.
#[allow(non_snake_case)]
#[no_mangle]
pub extern "C" fn Connect(interval_nanos: i64) {
    let interval = Duration::from_nanos(interval_nanos.max(0) as u64);
    global_producer().connect(interval);
}

/// Start the background regeneration loop.
#[allow(non_snake_case)]
#[no_mangle]
pub extern "C" fn Run() {
    global_producer().start();
}

/// Stop the regeneration loop. Reads keep serving the last-held record.
#[allow(non_snake_case)]
#[no_mangle]
pub extern "C" fn Disconnect() {
    global_producer().disconnect();
}

/// Read the current record, returned by value.
///
/// `mode` optionally names a wire format (`json`/`str`/`bin`); when it
/// parses, the encoded record is emitted at debug level as a side channel.
/// String arguments are known to arrive null or mangled from some foreign
/// callers, so the returned record never depends on `mode`.
///
/// # Safety
///
/// `mode` must be null or point to a valid NUL-terminated C string.
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn Read(mode: *const c_char) -> DriverResult {
    let record = global_producer().read();

    if !mode.is_null() {
        if let Ok(mode) = CStr::from_ptr(mode).to_str() {
            if let Ok(format) = mode.parse::<WireFormat>() {
                let payload = codec::encode(&record, format);
                tracing::debug!(
                    format = %format,
                    payload = %String::from_utf8_lossy(&payload),
                    "read side-channel dump"
                );
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_read_with_null_mode_returns_valid_record() {
        let record = unsafe { Read(std::ptr::null()) };
        assert!(record.is_read());
        assert!(record.iteration >= 0);
    }

    #[test]
    fn test_read_with_garbage_mode_returns_valid_record() {
        let mode = CString::new("definitely-not-a-format").unwrap();
        let record = unsafe { Read(mode.as_ptr()) };
        assert!(record.is_read());
    }

    #[test]
    fn test_connect_run_read_cycle() {
        Connect(1_000_000); // 1ms
        Run();
        std::thread::sleep(std::time::Duration::from_millis(20));

        let mode = CString::new("json").unwrap();
        let first = unsafe { Read(mode.as_ptr()) };
        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = unsafe { Read(std::ptr::null()) };

        assert!(first.iteration >= 1);
        assert!(second.iteration >= first.iteration);
        assert!(second.read_timestamp > first.read_timestamp);

        Disconnect();
    }
}

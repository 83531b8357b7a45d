//! RAII guard for COM initialization/teardown.

use crate::errors::{OpcError, OpcResult};
use std::marker::PhantomData;
use windows::Win32::System::Com::{COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize};

/// Drop guard for COM thread initialization.
///
/// [`ComGuard::new`] joins the Multi-Threaded Apartment (MTA); dropping the
/// guard calls `CoUninitialize`. The guard is `!Send` and `!Sync`, since
/// COM initialization is per-thread and must be undone on the same thread.
#[derive(Debug)]
pub struct ComGuard {
    _not_send: PhantomData<*mut ()>,
}

impl ComGuard {
    /// Initialize COM in MTA mode. `S_FALSE` (already initialized) counts
    /// as success.
    pub fn new() -> OpcResult<Self> {
        // SAFETY: `CoInitializeEx` is a standard Win32 FFI call. The result
        // is checked below, and `CoUninitialize` is guaranteed via Drop.
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };

        if let Err(e) = hr.ok() {
            tracing::error!(error = ?e, "COM MTA initialization failed");
            return Err(OpcError::from(e));
        }

        tracing::debug!("COM MTA initialized");

        Ok(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        tracing::debug!("COM MTA teardown");
        // SAFETY: Paired with the successful `CoInitializeEx` in `new()`,
        // and only runs on the creating thread (!Send).
        unsafe {
            CoUninitialize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn com_guard_constructs_and_drops() {
        let guard = ComGuard::new();
        assert!(guard.is_ok(), "ComGuard::new() should succeed: {guard:?}");
    }

    #[test]
    fn com_guard_nests_on_same_thread() {
        let outer = ComGuard::new().unwrap();
        let inner = ComGuard::new().unwrap();
        drop(inner);
        drop(outer);
    }
}

//! Backend implementations of [`OpcClient`](crate::OpcClient).
//!
//! The COM backend is gated behind the `opc-da-backend` feature and only
//! exists on Windows; every other build gets [`UnavailableClient`].

#[cfg(all(windows, feature = "opc-da-backend"))]
mod com_guard;
#[cfg(all(windows, feature = "opc-da-backend"))]
mod helpers;
#[cfg(all(windows, feature = "opc-da-backend"))]
pub mod opc_da;

pub mod unavailable;

/// Client used by default on this platform.
#[cfg(all(windows, feature = "opc-da-backend"))]
pub type DefaultClient = opc_da::OpcDaClient;

/// Client used by default on this platform.
#[cfg(not(all(windows, feature = "opc-da-backend")))]
pub type DefaultClient = unavailable::UnavailableClient;

//! # opc-scanner
//!
//! Connection manager for reading single OPC DA values with a bounded retry.
//!
//! ## Features
//! - `opc-da-backend` (default): COM backend via the `opc_da` crate (Windows only)
//! - `test-support`: Enables `MockOpcClient` via `mockall`

mod backend;
mod client;
mod errors;
mod scanner;

// Stable public API
pub use client::{ITEM_QUALITY, ITEM_VALUE, OpcClient, Property, QUALITY_GOOD, SessionInfo};
pub use errors::{
    DOES_NOT_EXIST, NO_READ_ATTEMPTED, NOT_CONNECTED, OpcError, OpcResult, QUALITY_NOT_GOOD,
    UNKNOWN_ITEM_SIGNATURE, VALUE_NOT_FOUND, classify_failure, friendly_hint,
    friendly_hresult_hint,
};
pub use scanner::{DEFAULT_MAX_RETRIES, DEFAULT_SERVER, OpcScanner, ReadOutcome};

// Backend re-exports (conditional)
pub use backend::DefaultClient;
pub use backend::unavailable::UnavailableClient;
#[cfg(all(windows, feature = "opc-da-backend"))]
pub use backend::opc_da::OpcDaClient;

// Test support re-export
#[cfg(feature = "test-support")]
pub use client::MockOpcClient;

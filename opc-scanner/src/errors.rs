use thiserror::Error;

/// Result type alias for OPC client operations.
pub type OpcResult<T> = Result<T, OpcError>;

/// Error text signature reported by OPC DA servers for an unknown item ID
/// (`OPC_E_UNKNOWNITEMID`).
pub const UNKNOWN_ITEM_SIGNATURE: &str = "OLE error 0xc0040007";

/// Classification returned by a read whose last failure matched
/// [`UNKNOWN_ITEM_SIGNATURE`].
pub const DOES_NOT_EXIST: &str = "DoesNotExist";

/// Pending failure text when "Item Quality" was missing or not `Good`.
pub const QUALITY_NOT_GOOD: &str = "Item quality not good on final pass";

/// Pending failure text when quality was good but no "Item Value" was listed.
pub const VALUE_NOT_FOUND: &str = "Didn't find 'Item Value' on final pass";

/// Failure text for a read attempted on a scanner with no session.
pub const NOT_CONNECTED: &str = "Not connected";

/// Failure text for a read with a zero retry budget.
pub const NO_READ_ATTEMPTED: &str = "No read attempted";

/// Centralized error enum for the OPC client layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpcError {
    /// A COM/DCOM failure carrying its HRESULT.
    ///
    /// The display form keeps the `OLE error 0x........` prefix (lowercase
    /// hex) so text-based classification of read failures keeps working.
    #[error("OLE error 0x{code:08x}: {message}")]
    Ole { code: u32, message: String },

    /// Connection-related errors (e.g., host unreachable, ProgID not resolvable).
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Operation attempted in an invalid state (e.g., already connected).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Feature not implemented or supported on this platform or server.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// Catch-all for unexpected internal failures.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpcError {
    /// Builds an [`OpcError::Ole`] from a raw HRESULT value.
    pub fn ole(code: u32, message: impl Into<String>) -> Self {
        Self::Ole {
            code,
            message: message.into(),
        }
    }
}

/// Maps known COM/DCOM error codes to actionable user hints.
///
/// # Examples
/// ```
/// use opc_scanner::friendly_hresult_hint;
///
/// assert_eq!(
///     friendly_hresult_hint(0x8004_0154),
///     Some("Server is not registered on this machine"),
/// );
/// assert_eq!(friendly_hresult_hint(0x1234), None);
/// ```
pub fn friendly_hresult_hint(code: u32) -> Option<&'static str> {
    match code {
        0x8004_0112 => Some("Server license does not permit OPC client connections"),
        0x8008_0005 => Some("Server process failed to start, check if it is installed and running"),
        0x8007_0005 => {
            Some("Access denied: DCOM launch/activation permissions not configured for this user")
        }
        0x8007_06BA => {
            Some("RPC server unavailable: the target host may be offline or blocking RPC")
        }
        0x8007_06F4 => Some("COM marshalling error, try restarting the OPC server"),
        0x8004_0154 => Some("Server is not registered on this machine"),
        0x8000_4003 => Some("Invalid pointer (E_POINTER)"),
        0xC004_0004 => Some("Server rejected the request, the item may be read-only (OPC_E_BADRIGHTS)"),
        0xC004_0007 => Some("Item ID not found in server address space (OPC_E_UNKNOWNITEMID)"),
        0xC004_0008 => Some("Item ID syntax is invalid for this server (OPC_E_INVALIDITEMID)"),
        _ => None,
    }
}

/// Maps an [`OpcError`] to a friendly hint if it carries a known HRESULT.
pub fn friendly_hint(error: &OpcError) -> Option<&'static str> {
    match error {
        OpcError::Ole { code, .. } => friendly_hresult_hint(*code),
        _ => None,
    }
}

/// Applies the known-signature classification to a terminal failure text.
///
/// Text containing [`UNKNOWN_ITEM_SIGNATURE`] becomes [`DOES_NOT_EXIST`];
/// anything else passes through unchanged.
pub fn classify_failure(text: String) -> String {
    if text.contains(UNKNOWN_ITEM_SIGNATURE) {
        DOES_NOT_EXIST.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ole_display_matches_unknown_item_signature() {
        let err = OpcError::ole(0xC004_0007, "The item ID is not defined");
        let text = err.to_string();
        assert!(text.contains(UNKNOWN_ITEM_SIGNATURE), "got: {text}");
        assert_eq!(text, "OLE error 0xc0040007: The item ID is not defined");
    }

    #[test]
    fn test_ole_display_pads_short_codes() {
        let err = OpcError::ole(0x5, "Access");
        assert_eq!(err.to_string(), "OLE error 0x00000005: Access");
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("OLE error 0xc0040007: unknown item".into()),
            DOES_NOT_EXIST
        );
        assert_eq!(classify_failure(QUALITY_NOT_GOOD.into()), QUALITY_NOT_GOOD);
        // Uppercase hex is a different signature and passes through
        assert_eq!(
            classify_failure("OLE error 0xC0040007".into()),
            "OLE error 0xC0040007"
        );
    }

    #[test]
    fn test_friendly_hint_known_codes() {
        assert_eq!(
            friendly_hint(&OpcError::ole(0x8007_06BA, "rpc")),
            Some("RPC server unavailable: the target host may be offline or blocking RPC")
        );
        assert_eq!(
            friendly_hint(&OpcError::ole(0xC004_0008, "bad id")),
            Some("Item ID syntax is invalid for this server (OPC_E_INVALIDITEMID)")
        );
    }

    #[test]
    fn test_friendly_hint_non_com_error() {
        assert_eq!(friendly_hint(&OpcError::Connection("down".into())), None);
        assert_eq!(friendly_hint(&OpcError::ole(0x1234, "?")), None);
    }
}

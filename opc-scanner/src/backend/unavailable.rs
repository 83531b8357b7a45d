use crate::client::{OpcClient, Property, SessionInfo};
use crate::errors::{OpcError, OpcResult};

/// Stand-in client for builds without an OPC DA backend.
///
/// Every connection attempt fails; closing is always a no-op.
#[derive(Debug, Default)]
pub struct UnavailableClient {
    client_name: String,
}

impl UnavailableClient {
    pub fn new(client_name: &str) -> OpcResult<Self> {
        tracing::debug!(client_name, "no OPC DA backend compiled in");
        Ok(Self {
            client_name: client_name.to_string(),
        })
    }

    fn unsupported() -> OpcError {
        OpcError::NotImplemented(format!(
            "OPC DA requires Windows COM and the `opc-da-backend` feature (target: {})",
            std::env::consts::OS
        ))
    }
}

impl OpcClient for UnavailableClient {
    fn connect(&mut self, server: &str, host: &str) -> OpcResult<()> {
        tracing::warn!(client = %self.client_name, server, host, "connect refused, no backend");
        Err(Self::unsupported())
    }

    fn properties(&self, _path: &str) -> OpcResult<Vec<Property>> {
        Err(Self::unsupported())
    }

    fn close(&mut self) -> OpcResult<()> {
        Ok(())
    }

    fn info(&self) -> OpcResult<SessionInfo> {
        Err(Self::unsupported())
    }
}

//! Connection manager around an [`OpcClient`].
//!
//! [`OpcScanner`] owns at most one session to a configured host and reads
//! single values with a bounded, delay-free retry loop.

use crate::client::{ITEM_QUALITY, ITEM_VALUE, OpcClient, QUALITY_GOOD, SessionInfo};
use crate::errors::{
    NO_READ_ATTEMPTED, NOT_CONNECTED, OpcError, OpcResult, QUALITY_NOT_GOOD, VALUE_NOT_FOUND,
    classify_failure, friendly_hint,
};

/// Server identity every scanner connects to unless overridden.
pub const DEFAULT_SERVER: &str = "OPC.DeltaV.1";

/// Default retry budget for [`OpcScanner::get_value`].
pub const DEFAULT_MAX_RETRIES: u32 = 500;

/// Outcome of a single value read.
///
/// The text of either variant is exactly what [`OpcScanner::get_value`]
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The item's value, from the first good-quality read.
    Value(String),
    /// Failure classification after the retry budget ran out.
    Failed(String),
}

impl ReadOutcome {
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Value(text) | Self::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Value(text) | Self::Failed(text) => text,
        }
    }
}

impl std::fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Lifecycle manager for a single session to one OPC host.
///
/// The session is released by [`OpcScanner::close`] or, failing that, when
/// the scanner is dropped.
///
/// # Examples
///
/// ```
/// use opc_scanner::{OpcClient, OpcResult, OpcScanner, Property, SessionInfo};
///
/// struct Fixed;
///
/// impl OpcClient for Fixed {
///     fn connect(&mut self, _server: &str, _host: &str) -> OpcResult<()> {
///         Ok(())
///     }
///     fn properties(&self, _path: &str) -> OpcResult<Vec<Property>> {
///         Ok(vec![
///             Property::new(3, "Item Quality", "Good"),
///             Property::new(2, "Item Value", "42.5"),
///         ])
///     }
///     fn close(&mut self) -> OpcResult<()> {
///         Ok(())
///     }
///     fn info(&self) -> OpcResult<SessionInfo> {
///         Ok(SessionInfo::default())
///     }
/// }
///
/// let mut scanner = OpcScanner::new(Fixed, "localhost");
/// scanner.connect()?;
/// assert_eq!(scanner.get_value("LIC_572989/AO1/BLOCK_ERR.CV"), "42.5");
/// scanner.close()?;
/// # Ok::<(), opc_scanner::OpcError>(())
/// ```
pub struct OpcScanner<C: OpcClient> {
    client: C,
    host: String,
    server: String,
    connected: bool,
}

impl<C: OpcClient> OpcScanner<C> {
    /// Creates a scanner for `host`. No connection is made yet.
    pub fn new(client: C, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
            server: DEFAULT_SERVER.to_string(),
            connected: false,
        }
    }

    /// Overrides the server ProgID used by [`OpcScanner::connect`].
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Establishes the session and returns its metadata.
    ///
    /// Connection failures are logged and returned as-is; they are never
    /// retried here. If the client connects but cannot describe the
    /// session, the metadata is empty and the session stays open.
    pub fn connect(&mut self) -> OpcResult<SessionInfo> {
        let span = tracing::info_span!("opc.connect", server = %self.server, host = %self.host);
        let _enter = span.enter();

        if self.connected {
            return Err(OpcError::InvalidState(format!(
                "already connected to {} on {}",
                self.server, self.host
            )));
        }

        if let Err(e) = self.client.connect(&self.server, &self.host) {
            let hint = friendly_hint(&e).unwrap_or("Check DCOM configuration and server status");
            tracing::error!(error = %e, hint, "connect failed");
            return Err(e);
        }
        self.connected = true;
        tracing::info!("connected to OPC server");

        // Metadata is diagnostic only; the session stands without it.
        let info = match self.client.info() {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "session info unavailable");
                SessionInfo::default()
            }
        };
        tracing::debug!(entries = info.entries.len(), "session info retrieved");
        Ok(info)
    }

    /// Reads the value at `path` with the default retry budget.
    pub fn get_value(&self, path: &str) -> String {
        self.get_value_with_retries(path, DEFAULT_MAX_RETRIES)
    }

    /// Reads the value at `path`, spending at most `max_retries` budget units.
    ///
    /// Returns the value text, or a failure classification once the budget
    /// is spent. See [`OpcScanner::read_value`].
    pub fn get_value_with_retries(&self, path: &str, max_retries: u32) -> String {
        self.read_value(path, max_retries).into_text()
    }

    /// Reads the value at `path` with a bounded, delay-free retry loop.
    ///
    /// Each attempt lists the item's properties. A `Good` "Item Quality"
    /// followed by an "Item Value" ends the loop with that value. Every
    /// other attempt spends budget and records a pending failure text:
    /// the client error, [`QUALITY_NOT_GOOD`] or [`VALUE_NOT_FOUND`]. A
    /// non-`Good` quality property also spends one unit on its own, so a
    /// bad-quality attempt costs two.
    ///
    /// Once the budget is gone the last pending text is returned, with
    /// unknown-item errors classified as
    /// [`DOES_NOT_EXIST`](crate::DOES_NOT_EXIST).
    pub fn read_value(&self, path: &str, max_retries: u32) -> ReadOutcome {
        let span = tracing::info_span!("opc.get_value", path = %path, max_retries);
        let _enter = span.enter();

        if !self.connected {
            tracing::warn!("read attempted without a session");
            return ReadOutcome::Failed(NOT_CONNECTED.to_string());
        }

        // Signed: a bad-quality attempt may spend two units and overshoot.
        let mut retries = i64::from(max_retries);
        let mut pending: Option<String> = None;
        let mut attempts = 0_u32;

        while retries > 0 {
            attempts += 1;
            let properties = match self.client.properties(path) {
                Ok(properties) => properties,
                Err(e) => {
                    retries -= 1;
                    tracing::debug!(attempt = attempts, error = %e, "property fetch failed");
                    pending = Some(e.to_string());
                    continue;
                }
            };

            let mut good = false;
            for quality in properties.iter().filter(|p| p.name == ITEM_QUALITY) {
                if quality.value == QUALITY_GOOD {
                    good = true;
                } else {
                    // Also charged again below when no Good quality is present.
                    retries -= 1;
                }
            }

            if good {
                if let Some(value) = properties.iter().find(|p| p.name == ITEM_VALUE) {
                    tracing::debug!(attempts, "value read");
                    return ReadOutcome::Value(value.value.clone());
                }
                retries -= 1;
                pending = Some(VALUE_NOT_FOUND.to_string());
            } else {
                retries -= 1;
                pending = Some(QUALITY_NOT_GOOD.to_string());
            }
        }

        let text = pending.map_or_else(|| NO_READ_ATTEMPTED.to_string(), classify_failure);
        tracing::warn!(attempts, outcome = %text, "retry budget exhausted");
        ReadOutcome::Failed(text)
    }

    /// Releases the session if one exists; a no-op otherwise.
    pub fn close(&mut self) -> OpcResult<()> {
        if !self.connected {
            return Ok(());
        }
        let span = tracing::info_span!("opc.close", server = %self.server, host = %self.host);
        let _enter = span.enter();

        self.connected = false;
        self.client.close()?;
        tracing::info!("session closed");
        Ok(())
    }
}

impl<C: OpcClient> Drop for OpcScanner<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "failed to close OPC session on drop");
        }
    }
}

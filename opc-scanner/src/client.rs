use crate::errors::OpcResult;

#[cfg(any(test, feature = "test-support"))]
use mockall::automock;

/// Property description the server reports for an item's quality.
pub const ITEM_QUALITY: &str = "Item Quality";

/// Property description the server reports for an item's current value.
pub const ITEM_VALUE: &str = "Item Value";

/// Quality label of a usable reading.
pub const QUALITY_GOOD: &str = "Good";

/// A single property of an OPC item, as listed by the server.
///
/// Returned by [`OpcClient::properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Server-assigned property ID (e.g., `2` for the item value).
    pub id: u32,
    /// Property description (e.g., `"Item Quality"`, `"Item Value"`).
    pub name: String,
    /// The property value as a display string.
    pub value: String,
}

impl Property {
    pub fn new(id: u32, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Descriptive metadata about an established session, as `(label, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub entries: Vec<(String, String)>,
}

impl SessionInfo {
    /// Appends a `(label, value)` entry, keeping insertion order.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.entries.push((label.into(), value.into()));
    }

    /// Looks up the first entry with the given label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = self.entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &self.entries {
            writeln!(f, "  {label:<width$}  {value}")?;
        }
        Ok(())
    }
}

/// Capability of an external OPC client.
///
/// Backends provide the actual COM/DCOM interaction; [`crate::OpcScanner`]
/// only ever talks to this trait, so it can run against a fake.
#[cfg_attr(any(test, feature = "test-support"), automock)]
pub trait OpcClient {
    /// Establish a session with `server` (a ProgID) on `host`.
    ///
    /// # Errors
    /// Returns `Err` if the ProgID cannot be resolved or the server cannot
    /// be instantiated on the host.
    fn connect(&mut self, server: &str, host: &str) -> OpcResult<()>;

    /// List all known properties of the item at `path`, in server order.
    ///
    /// # Errors
    /// Returns `Err` if there is no session or the server rejects the item.
    fn properties(&self, path: &str) -> OpcResult<Vec<Property>>;

    /// Release the session. Safe to call when never connected.
    fn close(&mut self) -> OpcResult<()>;

    /// Describe the current session for diagnostics.
    fn info(&self) -> OpcResult<SessionInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_lookup_and_order() {
        let mut info = SessionInfo::default();
        assert!(info.is_empty());
        info.push("OPC Server", "OPC.DeltaV.1");
        info.push("OPC Host", "10.0.0.5");

        assert_eq!(info.get("OPC Host"), Some("10.0.0.5"));
        assert_eq!(info.get("Missing"), None);
        assert_eq!(info.entries[0].0, "OPC Server");
    }

    #[test]
    fn test_session_info_display_aligns_labels() {
        let mut info = SessionInfo::default();
        info.push("Host", "plant-01");
        info.push("OPC Server", "OPC.DeltaV.1");

        let rendered = info.to_string();
        assert_eq!(
            rendered,
            "  Host        plant-01\n  OPC Server  OPC.DeltaV.1\n"
        );
    }
}

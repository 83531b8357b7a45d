use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "cfg.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("{}: {key} must be a non-empty host", path.display())]
    BlankHost { path: PathBuf, key: &'static str },
}

/// Hosts the probe can target, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeConfig {
    #[serde(rename = "OPC_HOST")]
    pub opc_host: String,
    #[serde(rename = "OPC_HOST_ALT")]
    pub opc_host_alt: String,
}

impl ProbeConfig {
    /// Loads and validates the JSON configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(path, &text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses configuration text; `path` is only used in error messages.
    pub fn from_json(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let empty = || ConfigError::Empty {
            path: path.to_path_buf(),
        };
        if text.trim().is_empty() {
            return Err(empty());
        }

        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        match &value {
            serde_json::Value::Null => return Err(empty()),
            serde_json::Value::Object(map) if map.is_empty() => return Err(empty()),
            _ => {}
        }

        let config: Self = serde_json::from_value(value).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        for (key, host) in [("OPC_HOST", &self.opc_host), ("OPC_HOST_ALT", &self.opc_host_alt)] {
            if host.trim().is_empty() {
                return Err(ConfigError::BlankHost {
                    path: path.to_path_buf(),
                    key,
                });
            }
        }
        Ok(())
    }

    /// The primary host, or the alternate one when `use_alt` is set.
    pub fn host(&self, use_alt: bool) -> &str {
        if use_alt {
            &self.opc_host_alt
        } else {
            &self.opc_host
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<ProbeConfig, ConfigError> {
        ProbeConfig::from_json(Path::new("cfg.json"), text)
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"OPC_HOST": "10.4.0.21", "OPC_HOST_ALT": "10.4.0.22", "NOTES": "plant B"}}"#
        )
        .unwrap();

        let config = ProbeConfig::load(file.path()).unwrap();
        assert_eq!(config.host(false), "10.4.0.21");
        assert_eq!(config.host(true), "10.4.0.22");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProbeConfig::load(&dir.path().join("cfg.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_empty_content_is_rejected() {
        assert!(matches!(parse(""), Err(ConfigError::Empty { .. })));
        assert!(matches!(parse("  \n"), Err(ConfigError::Empty { .. })));
        assert!(matches!(parse("{}"), Err(ConfigError::Empty { .. })));
        assert!(matches!(parse("null"), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        let err = parse(r#"{"OPC_HOST": "10.4.0.21"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("OPC_HOST_ALT"), "got: {err}");
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            parse(r#"{"OPC_HOST": "#),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_blank_host_is_rejected() {
        let err = parse(r#"{"OPC_HOST": "10.4.0.21", "OPC_HOST_ALT": "  "}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BlankHost {
                key: "OPC_HOST_ALT",
                ..
            }
        ));
    }
}

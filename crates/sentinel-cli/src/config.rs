use std::path::{Path, PathBuf};

use sentinel_commands::CommandError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default = "default_requests_table")]
    pub requests_table: String,
    #[serde(default = "default_break_glass_table")]
    pub break_glass_table: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Approval policy JSON. Absent means an empty policy — every profile
    /// is unmatched and approval is open to any authenticated caller.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
    /// Signed audit log destination. Absent disables audit logging.
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,
    /// Hex-encoded HMAC secret, at least 32 bytes once decoded.
    #[serde(default)]
    pub audit_key_file: Option<PathBuf>,
    #[serde(default = "default_key_id")]
    pub audit_key_id: String,
}

fn default_requests_table() -> String {
    "sentinel-requests".into()
}

fn default_break_glass_table() -> String {
    "sentinel-break-glass".into()
}

fn default_key_id() -> String {
    "primary".into()
}

impl Default for SentinelConfig {
    fn default() -> Self {
        SentinelConfig {
            requests_table: default_requests_table(),
            break_glass_table: default_break_glass_table(),
            region: None,
            policy_path: None,
            audit_log_path: None,
            audit_key_file: None,
            audit_key_id: default_key_id(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("sentinel").join("config.json"))
}

/// Load the config file, falling back to defaults when none exists. An
/// explicitly named file that is missing or malformed is an error; the
/// default location is allowed to be absent.
pub fn load(explicit: Option<&Path>) -> Result<SentinelConfig, CommandError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_config_path() {
            Some(path) => (path, false),
            None => return Ok(SentinelConfig::default()),
        },
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(SentinelConfig::default());
        }
        Err(e) => {
            return Err(CommandError::InvalidInput(format!(
                "failed to read config at {}: {e}",
                path.display()
            )));
        }
    };

    serde_json::from_str(&contents).map_err(|e| {
        CommandError::InvalidInput(format!("malformed config at {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_configured() {
        let config: SentinelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.requests_table, "sentinel-requests");
        assert_eq!(config.break_glass_table, "sentinel-break-glass");
        assert_eq!(config.audit_key_id, "primary");
        assert!(config.policy_path.is_none());
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config: SentinelConfig =
            serde_json::from_str(r#"{"requests_table": "custom", "region": "eu-west-1"}"#).unwrap();
        assert_eq!(config.requests_table, "custom");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.break_glass_table, "sentinel-break-glass");
    }
}

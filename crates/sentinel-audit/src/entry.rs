use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One line of the audit stream: an opaque domain payload plus the
/// signature envelope. The signature covers the canonical JSON bytes of
/// `entry` alone — envelope fields can be re-serialized freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedEntry {
    pub entry: serde_json::Value,
    pub signature: String,
    pub key_id: String,
    pub timestamp: Timestamp,
}

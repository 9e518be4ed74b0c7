//! sentinel-detect
//!
//! Untracked-session detector. Reads `AssumeRole` events from CloudTrail
//! over a time window, projects issued credentials out of the store, and
//! partitions the two into tracked, untracked (by reason), and orphaned
//! buckets. The correlation itself is a pure function — fetching is kept
//! at the edges so the partition logic is testable without AWS.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub mod correlate;
pub mod error;
pub mod session;
pub mod trail;

pub use crate::correlate::{DetectionReport, UntrackedReason, UntrackedSession, correlate};
pub use crate::error::DetectError;
pub use crate::session::{TrackedSession, sessions_in_window};
pub use crate::trail::{TrailEvent, lookup_assume_role_events};

/// The detection window plus optional narrowing filters. `role_arn`
/// filters trail events; `profile` filters store sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionWindow {
    pub start: Timestamp,
    pub end: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profile: Option<String>,
}

//! sentinel-core
//!
//! Pure domain types for the access-control plane: access requests,
//! break-glass events, approval policies, and the grammar shared by every
//! other crate. No AWS SDK dependency — this is the shared vocabulary of
//! the Sentinel system.

pub mod arn;
pub mod duration;
pub mod error;
pub mod id;
pub mod models;

pub use crate::error::CoreError;
pub use crate::models::break_glass::{BreakGlassEvent, BreakGlassStatus, ReasonCode};
pub use crate::models::policy::{ApprovalPolicy, ApprovalRule, AutoApproveCondition};
pub use crate::models::request::{Request, RequestStatus};

/// Prefix stamped on the STS source identity of every credential issued
/// through Sentinel. CloudTrail records it verbatim, which is what lets the
/// detector prove a session's provenance.
pub const SOURCE_IDENTITY_PREFIX: &str = "sentinel";

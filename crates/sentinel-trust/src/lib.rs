//! sentinel-trust
//!
//! Static analysis of IAM role trust documents against the enforcement
//! rules, plus the generator that produces the three canonical trust
//! patterns. Enforcement here is delegated to the trust document the
//! generator emits; this crate only measures how completely a role
//! funnels `sts:AssumeRole` through Sentinel.
//!
//! The analyzer and the generator are independent on purpose: analysis
//! never consults what the generator would have produced.

pub mod analyzer;
pub mod document;
pub mod error;
pub mod generator;
pub mod roles;

pub use crate::analyzer::{
    Analyzer, EnforcementLevel, Finding, RiskLevel, RiskSummary, RoleReport,
};
pub use crate::document::{Statement, TrustDocument};
pub use crate::error::TrustError;
pub use crate::generator::TrustPattern;
pub use crate::roles::validate_roles;

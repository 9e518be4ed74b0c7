//! sentinel-audit
//!
//! Append-only signed audit log. Every domain event is wrapped in a
//! [`SignedEntry`] whose HMAC-SHA256 signature covers the canonical JSON
//! bytes of the payload, then appended as one line of a line-delimited
//! JSON stream. Verification walks the stream line by line and reports
//! parse failures and signature mismatches distinctly.
//!
//! Audit writes are best-effort by design: a failed append leaves a gap
//! the verifier can detect, it never rolls back the state change that
//! preceded it.

pub mod canonical;
pub mod entry;
pub mod error;
pub mod events;
pub mod keys;
pub mod signer;
pub mod verifier;

pub use crate::entry::SignedEntry;
pub use crate::error::AuditError;
pub use crate::signer::{AuditLog, MIN_KEY_LEN, Signer};
pub use crate::verifier::{LineVerdict, VerifyReport, Verifier};

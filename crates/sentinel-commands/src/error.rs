use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("domain error: {0}")]
    Core(#[from] sentinel_core::CoreError),

    #[error("store error: {0}")]
    Store(#[from] sentinel_store::StoreError),

    #[error("audit error: {0}")]
    Audit(#[from] sentinel_audit::AuditError),

    #[error("detection error: {0}")]
    Detect(#[from] sentinel_detect::DetectError),

    #[error("trust error: {0}")]
    Trust(#[from] sentinel_trust::TrustError),

    #[error("STS error: {0}")]
    Sts(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("cancelled")]
    Cancelled,
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("signing key must be at least {min} bytes, got {len}")]
    KeyTooShort { min: usize, len: usize },

    #[error("invalid key material: {0}")]
    Key(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

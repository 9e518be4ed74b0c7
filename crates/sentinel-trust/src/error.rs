use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("malformed trust document: {0}")]
    Document(String),

    #[error("IAM error: {0}")]
    Iam(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

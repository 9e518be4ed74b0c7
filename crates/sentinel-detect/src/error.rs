use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("CloudTrail error: {0}")]
    CloudTrail(String),

    #[error("malformed trail event: {0}")]
    Event(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

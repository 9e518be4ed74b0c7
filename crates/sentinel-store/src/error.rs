use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {id}")]
    NotFound { id: String },

    #[error("already exists: {id}")]
    AlreadyExists { id: String },

    #[error("an active break-glass event already exists for {invoker}/{profile}")]
    ActiveExists { invoker: String, profile: String },

    #[error("concurrent modification of {id}")]
    ConcurrentModification { id: String },

    #[error("invalid entity: {0}")]
    InvalidEntity(#[from] sentinel_core::CoreError),

    #[error("malformed item: {0}")]
    Marshal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("DynamoDB error: {0}")]
    Dynamo(String),

    #[error("AWS config error: {0}")]
    Config(String),
}

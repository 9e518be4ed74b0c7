use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("justification must be {min}-{max} characters, got {len}")]
    JustificationLength {
        min: usize,
        max: usize,
        len: usize,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invariant violated: {0}")]
    Invariant(&'static str),

    #[error("unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

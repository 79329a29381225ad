// src/infra/errors.rs — Error types for seqforge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqforgeError {
    // Construction errors (a bug in the generator, never in the code under test)
    #[error("Operation '{operation}' takes {expected} input(s), got {actual}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Statement {position} references position {input}, which is not before it")]
    ForwardReference { position: usize, input: usize },

    #[error("Statement {position} uses the void result of statement {input}")]
    VoidReference { position: usize, input: usize },

    #[error("Input {slot} of '{operation}' expects {expected}, got {actual}")]
    TypeMismatch {
        operation: String,
        slot: usize,
        expected: String,
        actual: String,
    },

    #[error("Sequence is empty")]
    EmptySequence,

    #[error("Position {position} is out of range for a sequence of {len} statement(s)")]
    PositionOutOfRange { position: usize, len: usize },

    // Classification boundary
    #[error("Classification failed: {0}")]
    Classification(String),

    // User errors
    #[error("Unknown target '{name}'. Run `seqforge targets` to list the built-in ones.")]
    UnknownTarget { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeqforgeError {
    /// True for malformed-sequence errors, which indicate a generator bug.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            SeqforgeError::ArityMismatch { .. }
                | SeqforgeError::ForwardReference { .. }
                | SeqforgeError::VoidReference { .. }
                | SeqforgeError::TypeMismatch { .. }
                | SeqforgeError::EmptySequence
                | SeqforgeError::PositionOutOfRange { .. }
        )
    }
}

pub type Result<T, E = SeqforgeError> = std::result::Result<T, E>;

//! Error types shared across the timer, store and service layers

use thiserror::Error;

/// Errors raised while decoding or validating a persisted timer snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot violates invariant: {0}")]
    Invariant(&'static str),
}

/// Validation and lookup errors from speaker queue edits
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeakerError {
    #[error("Speaker name is required")]
    NameRequired,

    #[error("Topic is required")]
    TopicRequired,

    #[error("Duration must be greater than 0 (got {0})")]
    InvalidDuration(i64),

    #[error("speaker '{0}' not found")]
    NotFound(String),

    #[error("index {index} out of range for queue of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from a snapshot store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store key '{key}'")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to create store directory")]
    CreateDir(#[source] std::io::Error),

    #[error("failed to initialize store watcher")]
    Watch(#[from] notify::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the control service
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to lock {0}")]
    Lock(&'static str),

    #[error(transparent)]
    Speaker(#[from] SpeakerError),
}

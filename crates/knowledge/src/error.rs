//! Error taxonomy for the knowledge engine.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KnowledgeError>;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// The embedding provider failed to encode text.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("row {row} out of bounds for index with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    /// The index and the document store no longer agree on what exists.
    #[error("index/store divergence: {rows} index rows, {docs} documents")]
    Corruption { rows: usize, docs: usize },

    /// The generation backend failed to produce a reply.
    #[error("generation failed: {0}")]
    Generation(#[source] anyhow::Error),

    #[error("failed to persist knowledge state: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("failed to encode knowledge state: {0}")]
    Encode(#[from] serde_json::Error),

    /// A state file exists but cannot be parsed. Unlike an absent file,
    /// this never falls back to an empty state.
    #[error("state file {path} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        source: serde_json::Error,
    },
}

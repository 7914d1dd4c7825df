use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("no trained model at {}; run `leadgen train` first", path.display())]
    ModelUnavailable { path: PathBuf },

    #[error("model file I/O error at {}: {source}", path.display())]
    ModelIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model file is not valid JSON: {0}")]
    ModelFormat(#[from] serde_json::Error),

    #[error("model fingerprint mismatch: file says {expected}, payload hashes to {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    #[error("unsupported model format version {0}")]
    UnsupportedVersion(u32),

    #[error("insufficient training data: {0}")]
    InsufficientData(String),

    #[error("feature vector has {actual} values, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Record(#[from] leadgen_core::CoreError),

    #[error(transparent)]
    Store(#[from] leadgen_db::DbError),
}

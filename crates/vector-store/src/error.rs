use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Corrupt artifact {}: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("Inconsistent artifacts: {vectors} vectors vs {documents} documents")]
    InconsistentArtifacts { vectors: usize, documents: usize },

    #[error("Failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl VectorStoreError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Embedding failures leave the store untouched and may be retried by the caller.
    /// Everything else concerns store integrity and is fatal.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmbeddingError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_embedding_errors_are_recoverable() {
        assert!(VectorStoreError::EmbeddingError("timeout".into()).is_recoverable());
        assert!(!VectorStoreError::InconsistentArtifacts {
            vectors: 2,
            documents: 3
        }
        .is_recoverable());
        assert!(!VectorStoreError::corrupt("/tmp/vectors.bin", "bad magic").is_recoverable());
    }

    #[test]
    fn corrupt_artifact_message_names_path() {
        let err = VectorStoreError::corrupt("/tmp/vectors.bin", "bad magic");
        assert_eq!(err.to_string(), "Corrupt artifact /tmp/vectors.bin: bad magic");
    }
}

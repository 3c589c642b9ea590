use crate::documents::{DocumentRecord, DocumentStore};
use crate::error::{Result, VectorStoreError};
use crate::index::VectorIndex;
use crate::paths::{DOCUMENTS_FILE_NAME, VECTORS_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DOCUMENTS_SCHEMA_VERSION: u32 = 1;

const VECTORS_MAGIC: &[u8; 4] = b"SV01";
const VECTORS_HEADER_LEN: usize = 16;

#[derive(Serialize)]
struct PersistedDocumentsRef<'a> {
    schema_version: u32,
    documents: &'a [DocumentRecord],
}

#[derive(Deserialize)]
struct PersistedDocuments {
    schema_version: u32,
    documents: Vec<DocumentRecord>,
}

/// Locations of the two snapshot artifacts: the raw vector matrix and the
/// document records. Every save rewrites both in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFiles {
    vectors: PathBuf,
    documents: PathBuf,
}

impl SnapshotFiles {
    pub fn new(vectors: impl Into<PathBuf>, documents: impl Into<PathBuf>) -> Self {
        Self {
            vectors: vectors.into(),
            documents: documents.into(),
        }
    }

    /// Default artifact names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(VECTORS_FILE_NAME), dir.join(DOCUMENTS_FILE_NAME))
    }

    #[must_use]
    pub fn vectors_path(&self) -> &Path {
        &self.vectors
    }

    #[must_use]
    pub fn documents_path(&self) -> &Path {
        &self.documents
    }

    /// Load the persisted pair.
    ///
    /// `Ok(None)` when either artifact is missing. Unreadable, malformed or
    /// mutually inconsistent artifacts are errors, never silently dropped.
    pub async fn load(&self, expected_dimension: usize) -> Result<Option<(VectorIndex, DocumentStore)>> {
        if !exists(&self.vectors).await? || !exists(&self.documents).await? {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&self.vectors)
            .await
            .map_err(|e| VectorStoreError::corrupt(&self.vectors, e))?;
        let (dimension, data) =
            decode_vectors(&bytes).map_err(|reason| VectorStoreError::corrupt(&self.vectors, reason))?;
        if dimension != expected_dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: expected_dimension,
                actual: dimension,
            });
        }
        let index = VectorIndex::from_raw(dimension, data)
            .map_err(|e| VectorStoreError::corrupt(&self.vectors, e))?;

        let raw = tokio::fs::read(&self.documents)
            .await
            .map_err(|e| VectorStoreError::corrupt(&self.documents, e))?;
        let persisted: PersistedDocuments = serde_json::from_slice(&raw)
            .map_err(|e| VectorStoreError::corrupt(&self.documents, e))?;
        if persisted.schema_version != DOCUMENTS_SCHEMA_VERSION {
            return Err(VectorStoreError::corrupt(
                &self.documents,
                format!(
                    "unsupported schema_version {} (expected {DOCUMENTS_SCHEMA_VERSION})",
                    persisted.schema_version
                ),
            ));
        }
        let documents = DocumentStore::from_records(persisted.documents);

        if index.len() != documents.len() {
            return Err(VectorStoreError::InconsistentArtifacts {
                vectors: index.len(),
                documents: documents.len(),
            });
        }

        Ok(Some((index, documents)))
    }

    /// Write a full snapshot of both artifacts
    pub async fn save(&self, index: &VectorIndex, documents: &DocumentStore) -> Result<()> {
        let persisted = PersistedDocumentsRef {
            schema_version: DOCUMENTS_SCHEMA_VERSION,
            documents: documents.as_slice(),
        };
        let doc_bytes = serde_json::to_vec(&persisted)?;
        let vector_bytes = encode_vectors(index);

        let vectors_tmp = write_tmp(&self.vectors, &vector_bytes).await?;
        let documents_tmp = write_tmp(&self.documents, &doc_bytes).await?;

        // The committed vectors file is parked until the documents file lands,
        // so a failed second rename can put the previous pair back.
        let backup = sibling(&self.vectors, ".prev");
        let had_vectors = tokio::fs::metadata(&self.vectors).await.is_ok();
        if had_vectors {
            rename(&self.vectors, &backup).await?;
        }

        let committed = match rename(&vectors_tmp, &self.vectors).await {
            Ok(()) => rename(&documents_tmp, &self.documents).await,
            Err(err) => Err(err),
        };
        if let Err(err) = committed {
            self.restore_vectors(had_vectors.then_some(backup.as_path())).await;
            let _ = tokio::fs::remove_file(&vectors_tmp).await;
            let _ = tokio::fs::remove_file(&documents_tmp).await;
            return Err(err);
        }

        if had_vectors {
            if let Err(err) = tokio::fs::remove_file(&backup).await {
                log::warn!("Failed to remove {backup:?}: {err}");
            }
        }

        log::debug!(
            "Persisted snapshot: {} rows -> {:?}, {:?}",
            index.len(),
            self.vectors,
            self.documents
        );
        Ok(())
    }

    /// Put the parked vectors file back, or drop the new one if none was parked
    async fn restore_vectors(&self, backup: Option<&Path>) {
        let restored = match backup {
            Some(backup) => tokio::fs::rename(backup, &self.vectors).await,
            None => match tokio::fs::remove_file(&self.vectors).await {
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        match restored {
            Ok(()) => log::warn!("Snapshot write failed, kept previous {:?}", self.vectors),
            Err(err) => log::error!(
                "Snapshot write failed and {:?} could not be restored ({err}); \
                 {:?} and {:?} are now inconsistent",
                self.vectors,
                self.vectors,
                self.documents
            ),
        }
    }
}

async fn exists(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(VectorStoreError::corrupt(path, e)),
    }
}

async fn write_tmp(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| persist_err(parent, source))?;
    }
    let tmp = sibling(path, ".tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|source| persist_err(&tmp, source))?;
    Ok(tmp)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

async fn rename(from: &Path, to: &Path) -> Result<()> {
    tokio::fs::rename(from, to)
        .await
        .map_err(|source| persist_err(to, source))
}

fn persist_err(path: &Path, source: std::io::Error) -> VectorStoreError {
    VectorStoreError::Persist {
        path: path.to_path_buf(),
        source,
    }
}

/// `SV01` | dimension: u32 LE | rows: u64 LE | rows * dimension f32 LE
fn encode_vectors(index: &VectorIndex) -> Vec<u8> {
    let values = index.as_slice();
    let mut out = Vec::with_capacity(VECTORS_HEADER_LEN + values.len() * 4);
    out.extend_from_slice(VECTORS_MAGIC);
    #[allow(clippy::cast_possible_truncation)]
    let dim = index.dimension() as u32;
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode_vectors(bytes: &[u8]) -> std::result::Result<(usize, Vec<f32>), String> {
    if bytes.len() < VECTORS_HEADER_LEN {
        return Err(format!("truncated header ({} bytes)", bytes.len()));
    }
    if &bytes[0..4] != VECTORS_MAGIC {
        return Err("bad magic".to_string());
    }
    let dim = u32::from_le_bytes(bytes[4..8].try_into().map_err(|_| "bad dimension field")?) as usize;
    let rows = u64::from_le_bytes(bytes[8..16].try_into().map_err(|_| "bad row count field")?);
    let rows = usize::try_from(rows).map_err(|_| format!("row count {rows} too large"))?;

    let expected_len = rows
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(VECTORS_HEADER_LEN))
        .ok_or_else(|| format!("row count {rows} x dimension {dim} overflows"))?;
    if bytes.len() != expected_len {
        return Err(format!(
            "expected {expected_len} bytes for {rows} rows of dimension {dim}, found {}",
            bytes.len()
        ));
    }

    let data = bytes[VECTORS_HEADER_LEN..]
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((dim, data))
}

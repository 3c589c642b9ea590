use crate::documents::{DocumentRecord, DocumentStore};
use crate::embeddings::{normalize, EmbeddingProvider};
use crate::error::{Result, VectorStoreError};
use crate::index::VectorIndex;
use crate::persistence::SnapshotFiles;
use crate::types::{SearchResult, StoreStats};
use semrag_chunker::Chunk;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Aligned pair: row `i` of `index` embeds `documents[i].text`.
struct StoreState {
    index: VectorIndex,
    documents: DocumentStore,
}

impl StoreState {
    fn empty(dimension: usize) -> Self {
        Self {
            index: VectorIndex::new(dimension),
            documents: DocumentStore::new(),
        }
    }

    fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.documents.len());
        self.documents.len()
    }

    fn truncate(&mut self, len: usize) {
        self.index.truncate(len);
        self.documents.truncate(len);
    }
}

/// Embedding-backed passage store with exhaustive similarity search.
///
/// `add_chunks` and `clear` hold the write lock across mutation and
/// persistence; `search` only ever observes fully committed state.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    files: SnapshotFiles,
    state: RwLock<StoreState>,
}

impl VectorStore {
    /// Open the store, loading the persisted snapshot when both artifacts exist
    pub async fn open(embedder: Arc<dyn EmbeddingProvider>, files: SnapshotFiles) -> Result<Self> {
        let dimension = embedder.dimension();
        if dimension == 0 {
            return Err(VectorStoreError::EmbeddingError(format!(
                "model '{}' reports zero embedding dimension",
                embedder.model_name()
            )));
        }

        log::info!(
            "Opening VectorStore at {:?} (model: {}, dimension: {dimension})",
            files.vectors_path().parent().unwrap_or(files.vectors_path()),
            embedder.model_name()
        );

        let state = match files.load(dimension).await? {
            Some((index, documents)) => {
                log::info!("Loaded {} documents", documents.len());
                StoreState { index, documents }
            }
            None => {
                log::info!("No persisted snapshot found, starting empty");
                StoreState::empty(dimension)
            }
        };

        Ok(Self {
            embedder,
            files,
            state: RwLock::new(state),
        })
    }

    /// Embed and append chunks, then persist the full store.
    ///
    /// Embedding failures abort before anything is appended. If the snapshot
    /// cannot be written the in-memory state is rolled back and the error is
    /// returned.
    pub async fn add_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        log::info!("Adding {} chunks to store", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed_checked(&texts).await?;

        let count = chunks.len();
        let mut state = self.state.write().await;
        let committed = state.len();

        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            if let Err(err) = state.index.push(&vector) {
                state.truncate(committed);
                return Err(err);
            }
            state.documents.push(DocumentRecord::from(chunk));
        }

        if let Err(err) = self.files.save(&state.index, &state.documents).await {
            log::error!("Failed to persist store, rolling back {count} chunks: {err}");
            state.truncate(committed);
            return Err(err);
        }

        log::info!("Successfully added chunks. Total: {}", state.len());
        Ok(count)
    }

    /// Return the `top_k` passages most similar to `query`, best first
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let is_empty = self.state.read().await.documents.is_empty();
        if is_empty || top_k == 0 {
            return Ok(Vec::new());
        }

        log::debug!("Searching for: '{query}' (top_k: {top_k})");

        let query_vector = self
            .embed_checked(&[query.to_string()])
            .await?
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))?;

        let state = self.state.read().await;
        let hits = state.index.search(&query_vector, top_k)?;
        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|(row, score)| {
                state.documents.get(row).map(|doc| SearchResult {
                    text: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    score,
                })
            })
            .collect();

        log::debug!("Found {} results", results.len());
        Ok(results)
    }

    /// Drop every document and persist the empty store; dimension is kept
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let dimension = state.index.dimension();
        let previous = std::mem::replace(&mut *state, StoreState::empty(dimension));

        if let Err(err) = self.files.save(&state.index, &state.documents).await {
            log::error!("Failed to persist cleared store: {err}");
            *state = previous;
            return Err(err);
        }

        log::info!("Cleared {} documents", previous.len());
        Ok(())
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            total_documents: state.len(),
            embedding_dimension: state.index.dimension(),
            model_name: self.embedder.model_name().to_string(),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    #[must_use]
    pub const fn files(&self) -> &SnapshotFiles {
        &self.files
    }

    /// Embed a batch and validate it against the store's dimension
    async fn embed_checked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dimension = self.dimension();
        let mut vectors = self.embedder.embed_batch(texts).await?;

        if vectors.len() != texts.len() {
            return Err(VectorStoreError::EmbeddingError(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        for vector in &mut vectors {
            if vector.len() != dimension {
                return Err(VectorStoreError::EmbeddingError(format!(
                    "embedding has dimension {} (expected {dimension})",
                    vector.len()
                )));
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(VectorStoreError::EmbeddingError(
                    "embedding contains non-finite values".to_string(),
                ));
            }
            normalize(vector);
        }

        Ok(vectors)
    }
}

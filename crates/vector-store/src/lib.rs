//! # semrag vector store
//!
//! Persisted dense-vector store for text passages with exhaustive
//! cosine-similarity search.
//!
//! ## Features
//!
//! - **Exact search**: brute-force inner product over unit vectors
//! - **Pluggable embeddings** behind [`EmbeddingProvider`]
//! - **Full-snapshot persistence**: raw `f32` matrix + JSON document records
//! - **Reader/writer locking** so searches never see half-applied writes
//!
//! ## Architecture
//!
//! ```text
//! Chunk[]
//!     │
//!     ├──> EmbeddingProvider (stub / HTTP)
//!     │      └─> unit Vec<f32>[D]
//!     │
//!     ├──> VectorIndex  (row i) ──┐
//!     ├──> DocumentStore (row i) ─┴─> aligned by insertion order
//!     │
//!     └──> SnapshotFiles
//!            └─> vectors.bin + documents.json
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use semrag_chunker::chunk_text;
//! use semrag_vector_store::{SnapshotFiles, StubEmbedder, VectorStore};
//!
//! #[tokio::main]
//! async fn main() -> semrag_vector_store::Result<()> {
//!     let embedder = Arc::new(StubEmbedder::new(384));
//!     let store = VectorStore::open(embedder, SnapshotFiles::in_dir(".semrag/index")).await?;
//!
//!     let chunks = chunk_text("The sky is blue. Grass is green.", "colors.txt", 500, 50);
//!     store.add_chunks(chunks).await?;
//!
//!     for result in store.search("What colour is the sky?", 5).await? {
//!         println!("{}: {:.3}", result.metadata.source, result.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod documents;
mod embeddings;
mod error;
mod index;
mod paths;
mod persistence;
mod store;
mod types;

pub use documents::{DocumentRecord, DocumentStore};
pub use embeddings::{
    normalize, EmbeddingProvider, HttpEmbedder, HttpEmbedderConfig,
    StubEmbedder, STUB_MODEL_NAME,
};
pub use error::{Result, VectorStoreError};
pub use index::VectorIndex;
pub use paths::{default_index_dir_rel, DOCUMENTS_FILE_NAME, VECTORS_FILE_NAME};
pub use persistence::{SnapshotFiles, DOCUMENTS_SCHEMA_VERSION};
pub use store::VectorStore;
pub use types::{SearchResult, StoreStats};

// Re-export chunk types for convenience
pub use semrag_chunker::{Chunk, ChunkMetadata};

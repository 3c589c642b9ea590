use semrag_chunker::ChunkMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Inner product of unit vectors, i.e. cosine similarity in `[-1, 1]`
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: usize,
    pub embedding_dimension: usize,
    pub model_name: String,
}

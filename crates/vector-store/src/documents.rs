use semrag_chunker::{Chunk, ChunkMetadata};
use serde::{Deserialize, Serialize};

/// Persisted counterpart of a [`Chunk`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub chunk_index: usize,
}

impl From<Chunk> for DocumentRecord {
    fn from(chunk: Chunk) -> Self {
        Self {
            text: chunk.text,
            metadata: chunk.metadata,
            chunk_index: chunk.chunk_index,
        }
    }
}

/// Ordered passage records, row-aligned with the vector index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    records: Vec<DocumentRecord>,
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<DocumentRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: DocumentRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&DocumentRecord> {
        self.records.get(row)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DocumentRecord] {
        &self.records
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A contiguous passage of a source document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Passage text, trimmed of surrounding whitespace
    pub text: String,

    /// Position metadata
    pub metadata: ChunkMetadata,

    /// Sequential index among the emitted chunks of one document
    pub chunk_index: usize,
}

impl Chunk {
    /// Create a new chunk
    #[must_use]
    pub const fn new(text: String, metadata: ChunkMetadata, chunk_index: usize) -> Self {
        Self {
            text,
            metadata,
            chunk_index,
        }
    }
}

/// Metadata attached to every chunk.
///
/// Serializes as a flat map: the four position keys are always present and
/// any caller-supplied keys sit next to them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Source identifier (file name, URL, ...)
    pub source: String,

    /// Same value as [`Chunk::chunk_index`]
    pub chunk_index: usize,

    /// Window start, in characters of the trimmed source text
    pub start_char: usize,

    /// Window end (exclusive), in characters of the trimmed source text
    pub end_char: usize,

    /// Additional caller metadata
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ChunkMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, chunk_index: usize, start_char: usize, end_char: usize) -> Self {
        Self {
            source: source.into(),
            chunk_index,
            start_char,
            end_char,
            extra: BTreeMap::new(),
        }
    }

    /// Builder: attach an extra key. Reserved position keys are ignored.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved_key(&key) {
            self.extra.insert(key, value.into());
        }
        self
    }
}

fn is_reserved_key(key: &str) -> bool {
    matches!(key, "source" | "chunk_index" | "start_char" | "end_char")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn metadata_serializes_as_flat_map() {
        let metadata = ChunkMetadata::new("notes.md", 2, 10, 42).with_extra("lang", "en");
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "source": "notes.md",
                "chunk_index": 2,
                "start_char": 10,
                "end_char": 42,
                "lang": "en",
            })
        );

        let back: ChunkMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn reserved_keys_cannot_be_shadowed() {
        let metadata = ChunkMetadata::new("a.txt", 0, 0, 5).with_extra("start_char", 99);
        assert!(metadata.extra.is_empty());
        assert_eq!(metadata.start_char, 0);
        assert_eq!(serde_json::to_value(&metadata).unwrap()["start_char"], json!(0));
    }
}

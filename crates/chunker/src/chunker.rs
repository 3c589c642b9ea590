use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::{Chunk, ChunkMetadata};

/// Sentence terminators tried in priority order before falling back to a plain space.
const SENTENCE_BOUNDARIES: [[char; 2]; 3] = [['.', ' '], ['!', ' '], ['?', ' ']];

/// Passage chunker bound to a validated configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting configurations where `overlap >= chunk_size`
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split `text` into overlapping passages tagged with `source`
    #[must_use]
    pub fn chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        chunk_text(text, source, self.config.chunk_size, self.config.overlap)
    }
}

/// Split text into overlapping, boundary-aware chunks.
///
/// Offsets in the returned metadata are character offsets into `text.trim()`.
/// Never fails: empty or whitespace-only input yields no chunks, and
/// degenerate parameters still terminate with full coverage.
#[must_use]
pub fn chunk_text(text: &str, source: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let len = chars.len();
    let window = chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = (start + window).min(len);

        if end < len {
            if let Some(boundary) = find_boundary(&chars, start, end) {
                if boundary > start {
                    end = boundary + 1;
                }
            }
        }

        let body: String = chars[start..end].iter().collect();
        let body = body.trim();
        if !body.is_empty() {
            let chunk_index = chunks.len();
            chunks.push(Chunk::new(
                body.to_string(),
                ChunkMetadata::new(source, chunk_index, start, end),
                chunk_index,
            ));
        }

        let mut next = if end < len {
            end.saturating_sub(overlap)
        } else {
            end
        };
        // Each window must start strictly after the previous one.
        if next <= start {
            next = end;
        }
        start = next;
    }

    log::debug!("Chunked '{source}' into {} passages", chunks.len());
    chunks
}

/// Locate the break point for the window `[start, end)`.
///
/// The first pattern that occurs anywhere in the window wins, even if a lower
/// priority pattern sits closer to `end`.
fn find_boundary(chars: &[char], start: usize, end: usize) -> Option<usize> {
    SENTENCE_BOUNDARIES
        .iter()
        .find_map(|pattern| rfind_pair(chars, start, end, *pattern))
        .or_else(|| chars[start..end].iter().rposition(|c| *c == ' ').map(|p| start + p))
}

/// Last position `p` in `[start, end - 2]` where `chars[p..p + 2] == pattern`.
fn rfind_pair(chars: &[char], start: usize, end: usize, pattern: [char; 2]) -> Option<usize> {
    chars[start..end]
        .windows(2)
        .rposition(|pair| pair[0] == pattern[0] && pair[1] == pattern[1])
        .map(|p| start + p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offsets(chunks: &[Chunk]) -> Vec<(usize, usize)> {
        chunks
            .iter()
            .map(|c| (c.metadata.start_char, c.metadata.end_char))
            .collect()
    }

    #[test]
    fn empty_and_blank_text_produce_nothing() {
        assert!(chunk_text("", "a", 100, 10).is_empty());
        assert!(chunk_text("   \n\t  ", "a", 100, 10).is_empty());
    }

    #[test]
    fn short_text_is_single_trimmed_chunk() {
        let chunks = chunk_text("  The sky is blue.  ", "sky.txt", 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "The sky is blue.");
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].metadata.source, "sky.txt");
        assert_eq!(offsets(&chunks), vec![(0, 16)]);
    }

    #[test]
    fn prefers_sentence_boundary() {
        let text = "One two. Three four five six";
        let chunks = chunk_text(text, "s", 15, 0);
        assert_eq!(chunks[0].text, "One two.");
        assert_eq!(chunks[0].metadata.end_char, 8);
        assert_eq!(chunks[1].metadata.start_char, 8);
    }

    #[test]
    fn sentence_pattern_priority_beats_proximity() {
        // "! " sits closer to the cut but ". " has priority.
        let text = "Aa. Bb! Cc dd ee ff";
        let chunks = chunk_text(text, "s", 12, 0);
        assert_eq!(chunks[0].text, "Aa.");
    }

    #[test]
    fn falls_back_to_word_boundary() {
        let text = "alpha beta gamma delta";
        let chunks = chunk_text(text, "s", 13, 0);
        assert_eq!(chunks[0].text, "alpha beta");
        assert_eq!(chunks[0].metadata.end_char, 11);
    }

    #[test]
    fn hard_cut_without_boundaries() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, "s", 10, 0);
        assert_eq!(offsets(&chunks), vec![(0, 10), (10, 20), (20, 26)]);
        assert_eq!(chunks[2].text, "uvwxyz");
    }

    #[test]
    fn overlap_rewinds_next_window() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, "s", 10, 3);
        assert_eq!(offsets(&chunks), vec![(0, 10), (7, 17), (14, 24), (21, 26)]);
    }

    #[test]
    fn offsets_are_characters_not_bytes() {
        let text = "héllo wörld ünïcode";
        let chunks = chunk_text(text, "u", 8, 0);
        let total: usize = text.chars().count();
        assert_eq!(chunks.last().unwrap().metadata.end_char, total);
        assert_eq!(chunks[0].text, "héllo");
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let text = "word ".repeat(200);
        let chunks = chunk_text(&text, "w", 37, 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.metadata.chunk_index, i);
        }
    }

    #[test]
    fn overlap_close_to_chunk_size_still_progresses() {
        let text = "a b c d e f g h i j k l m n o p q r s t u v w x y z";
        let chunks = chunk_text(text, "s", 6, 5);
        let starts: Vec<usize> = chunks.iter().map(|c| c.metadata.start_char).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]), "{starts:?}");
        assert_eq!(
            chunks.last().unwrap().metadata.end_char,
            text.chars().count()
        );
    }

    #[test]
    fn degenerate_parameters_terminate() {
        let text = "some text here";
        let zero = chunk_text(text, "s", 0, 0);
        assert_eq!(zero.last().unwrap().metadata.end_char, 14);

        let wide_overlap = chunk_text(text, "s", 4, 40);
        assert_eq!(wide_overlap.last().unwrap().metadata.end_char, 14);
    }

    #[test]
    fn whitespace_only_windows_are_not_emitted() {
        let text = format!("a{}b", " ".repeat(30));
        let chunks = chunk_text(&text, "gap.txt", 10, 0);

        assert_eq!(offsets(&chunks), vec![(0, 10), (30, 32)]);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[test]
    fn chunker_rejects_invalid_config() {
        assert!(Chunker::new(ChunkerConfig::new(10, 10)).is_err());
        let chunker = Chunker::new(ChunkerConfig::new(10, 2)).unwrap();
        assert_eq!(chunker.chunk("hello", "x").len(), 1);
    }
}

//! # semrag chunker
//!
//! Boundary-aware splitting of plain text into overlapping passages for
//! embedding and retrieval.
//!
//! ## Algorithm
//!
//! ```text
//! trimmed text
//!     │
//!     ├──> window [start, start + chunk_size)
//!     │
//!     ├──> pull the end back to the last ". " / "! " / "? " / " "
//!     │
//!     ├──> emit trimmed passage + character offsets
//!     │
//!     └──> next start = end - overlap (always strictly forward)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use semrag_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(40, 10)).unwrap();
//! let chunks = chunker.chunk("First sentence here. Second sentence follows it.", "doc.txt");
//!
//! for chunk in &chunks {
//!     println!("#{} [{}..{}] {}",
//!              chunk.chunk_index, chunk.metadata.start_char, chunk.metadata.end_char, chunk.text);
//! }
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::{chunk_text, Chunker};
pub use config::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::{ChunkerError, Result};
pub use types::{Chunk, ChunkMetadata};

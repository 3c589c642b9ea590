use anyhow::{anyhow, Context as AnyhowContext, Result};
use clap::ValueEnum;
use semrag_chunker::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use semrag_vector_store::default_index_dir_rel;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmbedMode {
    /// Deterministic offline hash embeddings
    Stub,
    /// Ollama-compatible `/api/embed` endpoint
    Http,
}

impl FromStr for EmbedMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "http" => Ok(Self::Http),
            other => Err(anyhow!(
                "Unsupported SEMRAG_EMBEDDING_MODE '{other}' (expected 'stub' or 'http')"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub mode: EmbedMode,
    pub model: String,
    pub url: String,
    pub dimension: usize,
}

/// Process configuration: environment first, command-line flags on top
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub index_dir: PathBuf,
    pub embedding: EmbeddingSettings,
    pub chunker: ChunkerConfig,
    pub top_k: usize,
}

/// Flag values that take precedence over the environment
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub index_dir: Option<PathBuf>,
    pub embed_mode: Option<EmbedMode>,
    pub embed_model: Option<String>,
    pub embed_url: Option<String>,
    pub embed_dim: Option<usize>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let index_dir = lookup("SEMRAG_INDEX_DIR")
            .map_or_else(default_index_dir_rel, PathBuf::from);
        let mode = lookup("SEMRAG_EMBEDDING_MODE")
            .map(|raw| raw.parse::<EmbedMode>())
            .transpose()?
            .unwrap_or(EmbedMode::Stub);

        let embedding = EmbeddingSettings {
            mode,
            model: lookup("SEMRAG_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            url: lookup("SEMRAG_EMBEDDING_URL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_URL.to_string()),
            dimension: parse_var(&lookup, "SEMRAG_EMBEDDING_DIM", DEFAULT_EMBEDDING_DIM)?,
        };

        let chunker = ChunkerConfig::new(
            parse_var(&lookup, "SEMRAG_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            parse_var(&lookup, "SEMRAG_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
        );

        Ok(Self {
            index_dir,
            embedding,
            chunker,
            top_k: parse_var(&lookup, "SEMRAG_TOP_K", DEFAULT_TOP_K)?,
        })
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(dir) = overrides.index_dir {
            self.index_dir = dir;
        }
        if let Some(mode) = overrides.embed_mode {
            self.embedding.mode = mode;
        }
        if let Some(model) = overrides.embed_model {
            self.embedding.model = model;
        }
        if let Some(url) = overrides.embed_url {
            self.embedding.url = url;
        }
        if let Some(dim) = overrides.embed_dim {
            self.embedding.dimension = dim;
        }
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {key}='{raw}'")),
        None => Ok(default),
    }
}

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::{AppConfig, EmbedMode, Overrides};
use semrag_chunker::{Chunker, ChunkerConfig};
use semrag_vector_store::{
    EmbeddingProvider, HttpEmbedder, HttpEmbedderConfig, SearchResult, SnapshotFiles,
    StubEmbedder, VectorStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod loader;
mod prompt;

#[derive(Parser)]
#[command(name = "semrag")]
#[command(about = "Chunk plain-text documents and search them by meaning", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory holding the persisted index (overrides SEMRAG_INDEX_DIR)
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,

    /// Embedding backend (overrides SEMRAG_EMBEDDING_MODE)
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Embedding model id (overrides SEMRAG_EMBEDDING_MODEL)
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Embedding server base URL (overrides SEMRAG_EMBEDDING_URL)
    #[arg(long, global = true)]
    embed_url: Option<String>,

    /// Embedding dimension (overrides SEMRAG_EMBEDDING_DIM)
    #[arg(long, global = true)]
    embed_dim: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk text files and add the passages to the index
    Ingest(IngestArgs),

    /// Return the passages most similar to a query
    Search(SearchArgs),

    /// Remove every passage from the index
    Clear(ClearArgs),

    /// Show index statistics
    ///
    /// The model name is the one reported by the active embedder, so stub mode
    /// always shows `stub-hash` regardless of SEMRAG_EMBEDDING_MODEL.
    Stats(StatsArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Plain-text files (.txt, .text, .md, .markdown)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Maximum characters per passage (overrides SEMRAG_CHUNK_SIZE)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive passages (overrides SEMRAG_CHUNK_OVERLAP)
    #[arg(long)]
    overlap: Option<usize>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    query: String,

    /// Number of passages to return (overrides SEMRAG_TOP_K)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Also print the answer-generation prompt built from the results
    #[arg(long)]
    prompt: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ClearArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct IngestedFile {
    source: String,
    chunks_added: usize,
}

#[derive(Serialize)]
struct IngestOutput {
    files: Vec<IngestedFile>,
    total_chunks: usize,
}

#[derive(Serialize)]
struct SearchOutput {
    query: String,
    results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Ingest(args) => args.json,
        Commands::Search(args) => args.json,
        Commands::Clear(args) => args.json,
        Commands::Stats(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // reqwest/hyper are noisy at debug
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = AppConfig::from_env()?.with_overrides(Overrides {
        index_dir: cli.index_dir.clone(),
        embed_mode: cli.embed_mode,
        embed_model: cli.embed_model.clone(),
        embed_url: cli.embed_url.clone(),
        embed_dim: cli.embed_dim,
    });

    let store = open_store(&config).await?;

    match cli.command {
        Commands::Ingest(args) => run_ingest(&store, &config, args).await?,
        Commands::Search(args) => run_search(&store, &config, args).await?,
        Commands::Clear(args) => run_clear(&store, args).await?,
        Commands::Stats(args) => run_stats(&store, args).await?,
    }

    Ok(())
}

fn build_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let settings = &config.embedding;
    let embedder: Arc<dyn EmbeddingProvider> = match settings.mode {
        EmbedMode::Stub => Arc::new(StubEmbedder::new(settings.dimension)),
        EmbedMode::Http => Arc::new(
            HttpEmbedder::new(HttpEmbedderConfig::new(
                settings.url.clone(),
                settings.model.clone(),
                settings.dimension,
            ))
            .context("Failed to configure embedding client")?,
        ),
    };
    log::debug!(
        "Embedding provider: {} (dim {})",
        embedder.model_name(),
        embedder.dimension()
    );
    Ok(embedder)
}

async fn open_store(config: &AppConfig) -> Result<VectorStore> {
    let embedder = build_embedder(config)?;
    VectorStore::open(embedder, SnapshotFiles::in_dir(&config.index_dir))
        .await
        .with_context(|| format!("Failed to open index at {}", config.index_dir.display()))
}

async fn run_ingest(store: &VectorStore, config: &AppConfig, args: IngestArgs) -> Result<()> {
    let chunker = Chunker::new(ChunkerConfig::new(
        args.chunk_size.unwrap_or(config.chunker.chunk_size),
        args.overlap.unwrap_or(config.chunker.overlap),
    ))?;

    let mut files = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let document = loader::load_document(path)?;
        let chunks = chunker.chunk(&document.text, &document.source);
        if chunks.is_empty() {
            log::warn!("{} contains no text, skipping", path.display());
        }
        let chunks_added = store
            .add_chunks(chunks)
            .await
            .with_context(|| format!("Failed to index {}", path.display()))?;
        files.push(IngestedFile {
            source: document.source,
            chunks_added,
        });
    }

    let output = IngestOutput {
        total_chunks: files.iter().map(|f| f.chunks_added).sum(),
        files,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for file in &output.files {
            println!("{}: {} chunks", file.source, file.chunks_added);
        }
        println!("Total: {} chunks", output.total_chunks);
    }
    Ok(())
}

async fn run_search(store: &VectorStore, config: &AppConfig, args: SearchArgs) -> Result<()> {
    let top_k = args.top_k.unwrap_or(config.top_k);
    let results = store.search(&args.query, top_k).await?;
    let prompt = if args.prompt {
        Some(
            prompt::build_prompt(&args.query, &results)
                .unwrap_or_else(|| prompt::NO_CONTEXT_ANSWER.to_string()),
        )
    } else {
        None
    };

    if args.json {
        let output = SearchOutput {
            query: args.query,
            results,
            prompt,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {}#{}",
            rank + 1,
            result.score,
            result.metadata.source,
            result.metadata.chunk_index
        );
        println!("   {}", result.text.replace('\n', "\n   "));
    }
    if let Some(prompt) = prompt {
        println!("\n{prompt}");
    }
    Ok(())
}

async fn run_clear(store: &VectorStore, args: ClearArgs) -> Result<()> {
    let removed = store.len().await;
    store.clear().await.context("Failed to clear index")?;
    if args.json {
        println!("{}", serde_json::json!({ "cleared": removed }));
    } else {
        println!("Index cleared ({removed} passages removed)");
    }
    Ok(())
}

async fn run_stats(store: &VectorStore, args: StatsArgs) -> Result<()> {
    let stats = store.stats().await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Documents: {}", stats.total_documents);
        println!("Dimension: {}", stats.embedding_dimension);
        println!("Model:     {}", stats.model_name);
    }
    Ok(())
}

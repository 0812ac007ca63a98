use anyhow::Context;
use career_rag_embed::{EmbedConfig, FastEmbedProvider};
use career_rag_retriever::{
    config::RetrieverConfig,
    retrieval::{
        freshness::FreshnessTracker,
        indexing_pipeline::{Freshness, IndexingPipeline, RebuildOutcome},
        prompt::PromptAssembler,
        retriever::Retriever,
    },
    status::IndexStatus,
    storage::{VectorIndex, sqlite_store::SqliteVectorIndex},
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A CLI tool to build and query the career document index.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Folder containing the career documents
    #[arg(long, env = "CAREER_RAG_DOCS_DIR", default_value = "./rag/uploaded_files")]
    docs_dir: PathBuf,

    /// Folder holding index.db and index_metadata.json
    #[arg(long, env = "CAREER_RAG_PERSIST_DIR", default_value = "./rag_persist")]
    persist_dir: PathBuf,

    /// Collection name inside the database
    #[arg(long, env = "CAREER_RAG_COLLECTION", default_value = "career_documents")]
    collection: String,

    /// Window width in characters
    #[arg(long, default_value_t = career_rag_context::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Characters shared by consecutive windows
    #[arg(long, default_value_t = career_rag_context::DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show index statistics and whether a rebuild is pending
    Status {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Rebuild the index only if the documents changed
    Refresh,
    /// Rebuild the index unconditionally
    Rebuild,
    /// Retrieve the chunks nearest to a question
    Search {
        /// Question text
        query: String,
        /// Maximum number of results
        #[arg(short = 'k', long, default_value_t = career_rag_retriever::config::DEFAULT_TOP_K)]
        top_k: usize,
        /// Print the assembled generation prompt instead of the chunks
        #[arg(long)]
        prompt: bool,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Delete every indexed chunk and the folder snapshot
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = RetrieverConfig::new(&args.docs_dir, &args.persist_dir)
        .with_collection(args.collection.clone())
        .with_chunking(args.chunk_size, args.chunk_overlap);
    config
        .window_config()
        .context("invalid chunking configuration")?;

    let index = Arc::new(SqliteVectorIndex::open(&config.database_path(), &config.collection).await?);

    match args.command {
        Commands::Status { format } => {
            let status = IndexStatus::collect(&config, &index).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                OutputFormat::Summary => {
                    println!("Career RAG Index Status");
                    println!("=======================");
                    println!("  Collection: {}", status.collection);
                    println!("  Total chunks: {}", status.total_chunks);
                    println!("  Sources: {}", status.sources.len());
                    for source in status.sources.iter().take(10) {
                        println!("    {source}");
                    }
                    if status.sources.len() > 10 {
                        println!("    ... and {} more", status.sources.len() - 10);
                    }
                    if let Some(at) = status.last_indexed_at {
                        println!("  Last indexed: {at} UTC");
                    }
                    println!("  Files in folder: {}", status.folder_files);
                    match status.snapshot_files {
                        Some(n) => println!("  Files in snapshot: {n}"),
                        None => println!("  Files in snapshot: (no snapshot)"),
                    }
                    if let Some(size) = status.database_size_bytes {
                        println!("  Database size: {size} bytes");
                    }
                    match &status.stale_reason {
                        Some(reason) => println!("  Up to date: No ({reason})"),
                        None => println!("  Up to date: Yes"),
                    }
                }
            }
            Ok(())
        }
        Commands::Refresh => {
            let pipeline = open_pipeline(&config, index).await?;
            match pipeline.ensure_fresh().await? {
                Freshness::Fresh => println!("Index is up to date"),
                Freshness::Rebuilt { chunks, reason } => {
                    println!("Rebuilt index with {chunks} chunks ({reason})")
                }
                Freshness::Unavailable(skip) => println!("Index not rebuilt: {skip}"),
            }
            Ok(())
        }
        Commands::Rebuild => {
            let pipeline = open_pipeline(&config, index).await?;
            match pipeline.force_rebuild().await? {
                RebuildOutcome::Rebuilt { chunks } => println!("Rebuilt index with {chunks} chunks"),
                RebuildOutcome::Skipped(skip) => println!("Index not rebuilt: {skip}"),
            }
            Ok(())
        }
        Commands::Search {
            query,
            top_k,
            prompt,
            format,
        } => {
            let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
            let pipeline = IndexingPipeline::new(&config, embedder.clone(), index.clone())?;
            if !pipeline.ensure_fresh().await?.is_ready() {
                anyhow::bail!("no documents indexed in {}", config.docs_dir.display());
            }

            let chunks = Retriever::new(index, embedder)
                .retrieve_text(&query, top_k)
                .await?;

            if prompt {
                println!("{}", PromptAssembler::default().assemble(&query, &chunks));
                return Ok(());
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chunks)?),
                OutputFormat::Summary => {
                    println!("Found {} similar chunks:", chunks.len());
                    for chunk in chunks {
                        println!(
                            "  Similarity: {:.3} | ID: {} | File: {} | Chunk: {}",
                            chunk.similarity, chunk.id, chunk.metadata.source, chunk.metadata.chunk_id
                        );
                        println!(
                            "    {}",
                            chunk.text.chars().take(100).collect::<String>()
                        );
                    }
                }
            }
            Ok(())
        }
        Commands::Clear => {
            let ids = index.list_ids().await?;
            let deleted = index.delete(&ids).await?;
            FreshnessTracker::new(&config.persist_dir)
                .clear_snapshot()
                .await?;
            println!("Index cleared ({deleted} chunks deleted)");
            Ok(())
        }
    }
}

async fn open_pipeline(
    config: &RetrieverConfig,
    index: Arc<SqliteVectorIndex>,
) -> anyhow::Result<IndexingPipeline> {
    let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
    IndexingPipeline::new(config, embedder, index)
}

//! End-to-end example of the indexing and retrieval workflow
//!
//! This example shows how to:
//! 1. Write a few career documents into a temporary folder
//! 2. Build the index with the MiniLM embedding model
//! 3. Retrieve the chunks closest to a Holland code query
//! 4. Assemble the generation prompt from them
//!
//! Note: the first run downloads the embedding model into `.fastembed_cache`.

use anyhow::Result;
use career_rag_embed::{EmbedConfig, FastEmbedProvider};
use career_rag_retriever::{
    config::RetrieverConfig,
    retrieval::{indexing_pipeline::IndexingPipeline, prompt::PromptAssembler, retriever::Retriever},
    storage::sqlite_store::SqliteVectorIndex,
};
use std::sync::Arc;
use tempfile::tempdir;

const DOCUMENTS: [(&str, &str); 3] = [
    (
        "realistic.txt",
        "Realistic (R) people prefer hands-on work with tools, machines and animals. \
         Suitable careers include mechanical technician, electrician, farmer and civil engineer.",
    ),
    (
        "investigative.txt",
        "Investigative (I) people enjoy observing, analysing and solving problems. \
         Suitable careers include data scientist, physician, chemist and research analyst.",
    ),
    (
        "social.txt",
        "Social (S) people like helping, teaching and counselling others. \
         Suitable careers include teacher, nurse, social worker and career counsellor.",
    ),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let temp_dir = tempdir()?;
    let config = RetrieverConfig::new(
        temp_dir.path().join("uploaded_files"),
        temp_dir.path().join("rag_persist"),
    );
    tokio::fs::create_dir_all(&config.docs_dir).await?;
    for (name, content) in DOCUMENTS {
        tokio::fs::write(config.docs_dir.join(name), content).await?;
    }

    let embedder = Arc::new(FastEmbedProvider::create(EmbedConfig::default()).await?);
    let index = Arc::new(SqliteVectorIndex::open(&config.database_path(), &config.collection).await?);
    let pipeline = IndexingPipeline::new(&config, embedder.clone(), index.clone())?;

    println!("Indexing: {:?}", pipeline.ensure_fresh().await?);
    println!("Second check: {:?}\n", pipeline.ensure_fresh().await?);

    let query = "Which careers fit someone who likes research and analysis?";
    let chunks = Retriever::new(index, embedder)
        .retrieve_text(query, config.top_k)
        .await?;
    for chunk in &chunks {
        println!(
            "{:.3}  {}  {}",
            chunk.similarity, chunk.id, chunk.metadata.source
        );
    }

    println!("\n{}", PromptAssembler::default().assemble(query, &chunks));
    Ok(())
}

//! # career-rag-service
//!
//! HTTP service that turns a student's personality code into a complete
//! career report: recommendations generated from the indexed career documents,
//! a learning plan, current job listings and an email summary.
//!
//! ## Architecture
//!
//! The service wires together the other workspace crates:
//! - [`career-rag-retriever`] for the document index, retrieval and prompts
//! - [`career-rag-embed`] for query and chunk embeddings
//! - [`career-rag-context`] for chunking, through the retriever
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET | `/` | Service descriptor |
//! | GET | `/health` | Liveness and index readiness |
//! | POST | `/api/ai/complete-analysis` | Run the analysis workflow |
//! | POST | `/api/admin/reindex-documents` | Clear the index so the next analysis rebuilds it |
//! | POST | `/api/ml/predict-code` | Predict a personality code from answers |
//!
//! ## Quick Start
//!
//! ```bash
//! DEEPSEEK_API_KEY=... career-rag-service --docs-dir ./rag/uploaded_files
//! ```

pub mod classifier;
pub mod config;
pub mod jobs;
pub mod llm;
pub mod mailer;
pub mod server;
pub mod workflow;

pub use config::ServiceConfig;

use anyhow::{Context, Result};
use career_rag_embed::FastEmbedProvider;
use career_rag_retriever::{
    retrieval::{indexing_pipeline::IndexingPipeline, retriever::Retriever},
    storage::sqlite_store::SqliteVectorIndex,
};
use std::sync::Arc;
use tracing::{info, warn};

use classifier::PersonalityClassifier;
use jobs::JobicyBoard;
use llm::{AnswerGenerator, DeepSeekClient};
use mailer::SmtpMailer;
use server::AppState;
use workflow::{
    AnalysisWorkflow, email::EmailStep, jobs::JobsStep, learning::LearningStep, rag::RagStep,
};

/// Construct every shared service from `config`.
///
/// # Errors
/// - Invalid chunking settings
/// - The vector database cannot be opened
/// - The embedding model cannot be loaded
pub async fn build_state(config: &ServiceConfig) -> Result<Arc<AppState>> {
    config
        .retriever
        .window_config()
        .context("invalid chunking configuration")?;

    let embedder = Arc::new(FastEmbedProvider::create(config.embed.clone()).await?);
    let index = Arc::new(
        SqliteVectorIndex::open(
            &config.retriever.database_path(),
            &config.retriever.collection,
        )
        .await
        .context("failed to open vector database")?,
    );
    let pipeline = Arc::new(IndexingPipeline::new(
        &config.retriever,
        embedder.clone(),
        index.clone(),
    )?);

    let chat = Arc::new(DeepSeekClient::new(config.llm.clone())?);
    if !chat.is_configured() {
        warn!("DEEPSEEK_API_KEY is not set; generation steps will use fallbacks");
    }
    let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
    if !mailer.is_configured() {
        warn!("SMTP credentials are not set; emails will not be sent");
    }
    let board = Arc::new(JobicyBoard::new(config.jobs_url.clone())?);

    let classifier = match PersonalityClassifier::load(&config.classifier_dir) {
        Ok(classifier) => Some(classifier),
        Err(err) => {
            warn!("Personality classifier unavailable: {}", err);
            None
        }
    };

    let workflow = AnalysisWorkflow::new(
        RagStep::new(
            pipeline.clone(),
            Retriever::new(index, embedder),
            AnswerGenerator::new(chat.clone()),
        ),
        LearningStep::new(chat.clone()),
        JobsStep::new(board),
        EmailStep::new(chat, mailer),
    );

    Ok(Arc::new(AppState {
        workflow,
        pipeline,
        classifier,
    }))
}

/// Build the services and serve HTTP on `config.bind` until Ctrl-C.
pub async fn run_server(config: ServiceConfig) -> Result<()> {
    let state = build_state(&config).await?;
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Career RAG service listening on {}", listener.local_addr()?);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Career RAG service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}

//! Test doubles for the service's external dependencies.
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use career_rag_embed::{EmbeddingProvider, EmbeddingResult};
use career_rag_retriever::{
    config::RetrieverConfig,
    retrieval::{indexing_pipeline::IndexingPipeline, retriever::Retriever},
    storage::sqlite_store::SqliteVectorIndex,
};
use career_rag_service::{
    classifier::PersonalityClassifier,
    jobs::{JobBoard, JobPosting},
    llm::{AnswerGenerator, ChatClient, ChatMessage, ChatOptions, GenerationError},
    mailer::{EmailMessage, MailError, Mailer},
    server::AppState,
    workflow::{
        AnalysisWorkflow, email::EmailStep, jobs::JobsStep, learning::LearningStep, rag::RagStep,
    },
};
use half::f16;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const KEYWORDS: [&str; 3] = ["realistic", "investigative", "social"];

/// One dimension per keyword, counting occurrences.
pub struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed_text(&self, text: &str) -> career_rag_embed::Result<Vec<f16>> {
        let lower = text.to_lowercase();
        Ok(KEYWORDS
            .iter()
            .map(|k| f16::from_f32(lower.matches(k).count() as f32 + 0.01))
            .collect())
    }

    async fn embed_texts(&self, texts: &[String]) -> career_rag_embed::Result<EmbeddingResult> {
        let mut embeddings = Vec::new();
        for text in texts {
            embeddings.push(self.embed_text(text).await?);
        }
        Ok(EmbeddingResult::new(embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        KEYWORDS.len()
    }

    fn provider_name(&self) -> &str {
        "keyword"
    }
}

/// Replies with a fixed text, or fails as unconfigured when `reply` is `None`.
pub struct CannedChat {
    pub reply: Option<String>,
    pub calls: Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
}

impl CannedChat {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, ChatOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for CannedChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options));
        self.reply.clone().ok_or(GenerationError::NotConfigured)
    }
}

pub struct StubBoard {
    pub jobs: std::result::Result<Vec<JobPosting>, String>,
}

impl StubBoard {
    pub fn with_jobs(count: usize) -> Arc<Self> {
        let jobs = (1..=count)
            .map(|i| JobPosting {
                title: format!("Job {i}"),
                company: format!("Company {i}"),
                url: format!("https://jobs.example/{i}"),
            })
            .collect();
        Arc::new(Self { jobs: Ok(jobs) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            jobs: Err(message.to_string()),
        })
    }
}

#[async_trait]
impl JobBoard for StubBoard {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        self.jobs.clone().map_err(|e| anyhow!(e))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MailMode {
    Deliver,
    NotConfigured,
    Reject,
}

pub struct RecordingMailer {
    pub mode: MailMode,
    pub sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn new(mode: MailMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> std::result::Result<(), MailError> {
        match self.mode {
            MailMode::Deliver => {
                self.sent.lock().unwrap().push(message.clone());
                Ok(())
            }
            MailMode::NotConfigured => Err(MailError::NotConfigured),
            MailMode::Reject => Err(MailError::Smtp("mailbox unavailable".to_string())),
        }
    }
}

pub struct Harness {
    pub temp_dir: TempDir,
    pub config: RetrieverConfig,
    pub index: Arc<SqliteVectorIndex>,
    pub pipeline: Arc<IndexingPipeline>,
}

impl Harness {
    /// Folder with `documents`, an empty on-disk index and a pipeline over them.
    pub async fn new(documents: &[(&str, &str)]) -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let config = RetrieverConfig::new(
            temp_dir.path().join("uploaded_files"),
            temp_dir.path().join("rag_persist"),
        );
        tokio::fs::create_dir_all(&config.docs_dir).await?;
        for (name, content) in documents {
            tokio::fs::write(config.docs_dir.join(name), content).await?;
        }
        let index =
            Arc::new(SqliteVectorIndex::open(&config.database_path(), &config.collection).await?);
        let pipeline = Arc::new(IndexingPipeline::new(
            &config,
            Arc::new(KeywordEmbedder),
            index.clone(),
        )?);
        Ok(Self {
            temp_dir,
            config,
            index,
            pipeline,
        })
    }

    pub fn workflow(
        &self,
        chat: Arc<CannedChat>,
        board: Arc<StubBoard>,
        mailer: Arc<RecordingMailer>,
    ) -> AnalysisWorkflow {
        AnalysisWorkflow::new(
            RagStep::new(
                self.pipeline.clone(),
                Retriever::new(self.index.clone(), Arc::new(KeywordEmbedder)),
                AnswerGenerator::new(chat.clone()),
            ),
            LearningStep::new(chat.clone()),
            JobsStep::new(board),
            EmailStep::new(chat, mailer),
        )
    }

    pub fn app_state(
        &self,
        workflow: AnalysisWorkflow,
        classifier: Option<PersonalityClassifier>,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            workflow,
            pipeline: self.pipeline.clone(),
            classifier,
        })
    }
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn_router(router: axum::Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

pub const CAREER_DOCS: [(&str, &str); 3] = [
    (
        "investigative.txt",
        "Investigative people enjoy research. Careers: scientist, analyst.",
    ),
    (
        "realistic.txt",
        "Realistic people enjoy tools. Careers: electrician, mechanic.",
    ),
    (
        "social.txt",
        "Social people enjoy helping. Careers: teacher, nurse.",
    ),
];

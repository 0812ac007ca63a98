use anyhow::Result;
use career_rag_embed::EmbedConfig;
use career_rag_retriever::config::RetrieverConfig;
use career_rag_service::{
    ServiceConfig, jobs::DEFAULT_JOBS_URL, llm::LlmConfig, mailer::SmtpSettings, run_server,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Career guidance AI service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "CAREER_RAG_BIND", default_value = career_rag_service::config::DEFAULT_BIND)]
    bind: SocketAddr,

    /// Folder containing the career documents
    #[arg(long, env = "CAREER_RAG_DOCS_DIR", default_value = "./rag/uploaded_files")]
    docs_dir: PathBuf,

    /// Folder holding index.db and index_metadata.json
    #[arg(long, env = "CAREER_RAG_PERSIST_DIR", default_value = "./rag_persist")]
    persist_dir: PathBuf,

    /// Collection name inside the vector database
    #[arg(long, env = "CAREER_RAG_COLLECTION", default_value = "career_documents")]
    collection: String,

    /// Folder where the embedding model is cached
    #[arg(long, env = "CAREER_RAG_MODEL_CACHE", default_value = ".fastembed_cache")]
    model_cache: PathBuf,

    /// DeepSeek API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    deepseek_api_key: Option<String>,

    /// DeepSeek-compatible API base URL
    #[arg(long, env = "DEEPSEEK_API_BASE", default_value = career_rag_service::llm::DEFAULT_API_BASE)]
    deepseek_api_base: String,

    /// Remote jobs API URL
    #[arg(long, env = "CAREER_RAG_JOBS_URL", default_value = DEFAULT_JOBS_URL)]
    jobs_url: String,

    /// Sender address for result emails
    #[arg(long, env = "SENDER_EMAIL")]
    sender_email: Option<String>,

    /// App password of the sender account
    #[arg(long, env = "SENDER_APP_PASSWORD", hide_env_values = true)]
    sender_app_password: Option<String>,

    #[arg(long, env = "SMTP_SERVER", default_value = career_rag_service::mailer::DEFAULT_SMTP_SERVER)]
    smtp_server: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = career_rag_service::mailer::DEFAULT_SMTP_PORT)]
    smtp_port: u16,

    /// Folder containing classifier.json
    #[arg(long, env = "CAREER_RAG_CLASSIFIER_DIR", default_value = career_rag_service::config::DEFAULT_CLASSIFIER_DIR)]
    classifier_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            bind: self.bind,
            retriever: RetrieverConfig::new(self.docs_dir, self.persist_dir)
                .with_collection(self.collection),
            embed: EmbedConfig::default().with_cache_dir(self.model_cache),
            llm: LlmConfig {
                api_key: self.deepseek_api_key,
                api_base: self.deepseek_api_base,
                ..LlmConfig::default()
            },
            smtp: SmtpSettings::from_parts(
                self.sender_email,
                self.sender_app_password,
                self.smtp_server,
                self.smtp_port,
            ),
            jobs_url: self.jobs_url,
            classifier_dir: self.classifier_dir,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();
    run_server(config).await
}

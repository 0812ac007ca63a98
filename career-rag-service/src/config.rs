//! Service configuration.

use career_rag_embed::EmbedConfig;
use career_rag_retriever::config::RetrieverConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::jobs::DEFAULT_JOBS_URL;
use crate::llm::LlmConfig;
use crate::mailer::SmtpSettings;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CLASSIFIER_DIR: &str = "./model_artifacts";

/// Everything needed to build the shared services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub retriever: RetrieverConfig,
    pub embed: EmbedConfig,
    pub llm: LlmConfig,
    /// `None` leaves email delivery disabled
    pub smtp: Option<SmtpSettings>,
    pub jobs_url: String,
    pub classifier_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            retriever: RetrieverConfig::default(),
            embed: EmbedConfig::default(),
            llm: LlmConfig::default(),
            smtp: None,
            jobs_url: DEFAULT_JOBS_URL.to_string(),
            classifier_dir: PathBuf::from(DEFAULT_CLASSIFIER_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_matches_constant() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert!(config.smtp.is_none());
        assert_eq!(config.retriever.collection, "career_documents");
    }

    #[test]
    fn test_debug_output_has_no_secrets() {
        let config = ServiceConfig {
            llm: LlmConfig {
                api_key: Some("sk-live-secret".to_string()),
                ..LlmConfig::default()
            },
            smtp: SmtpSettings::from_parts(
                Some("sender@example.com".into()),
                Some("app-password-123".into()),
                "smtp.example.com",
                587,
            ),
            ..ServiceConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-live-secret"));
        assert!(!printed.contains("app-password-123"));
    }
}

//! Career recommendations from the indexed documents.

use anyhow::Result;
use career_rag_retriever::retrieval::{
    indexing_pipeline::{Freshness, IndexingPipeline},
    prompt::PromptAssembler,
    retriever::Retriever,
};
use std::sync::Arc;
use tracing::{error, info};

use super::state::AnalysisState;
use crate::llm::AnswerGenerator;

/// Chunks retrieved per analysis.
pub const WORKFLOW_TOP_K: usize = 10;

pub const NO_INFORMATION: &str = "لا تتوفر معلومات مهنية.";
pub const NO_CODE: &str = "رمز الشخصية غير متوفر.";

/// Message stored when a step fails.
pub fn error_message(err: impl std::fmt::Display) -> String {
    format!("حدث خطأ: {err}")
}

/// Retrieval question for a Holland code.
pub fn career_query(code: &str) -> String {
    format!(
        "بناءً على رمز الشخصية {code} حسب نظرية هولند:\n\
         1. اشرح سمات الشخصية بالتفصيل\n\
         2. قدم توصيات مهنية مفصلة\n\
         3. نظم الإجابة تحت عنوانين: \"سمات الشخصية\" و \"التوصيات المهنية\"\n"
    )
}

pub struct RagStep {
    pipeline: Arc<IndexingPipeline>,
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: AnswerGenerator,
    top_k: usize,
}

impl RagStep {
    pub fn new(
        pipeline: Arc<IndexingPipeline>,
        retriever: Retriever,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            pipeline,
            retriever,
            assembler: PromptAssembler::default(),
            generator,
            top_k: WORKFLOW_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub async fn run(&self, state: &mut AnalysisState) {
        let output = match self.recommend(state.code()).await {
            Ok(text) => text,
            Err(err) => {
                error!("Career recommendation failed: {:#}", err);
                error_message(err)
            }
        };
        state.career_recommendations = Some(output);
    }

    async fn recommend(&self, code: &str) -> Result<String> {
        if let Freshness::Unavailable(reason) = self.pipeline.ensure_fresh().await? {
            info!("No career information available: {}", reason);
            return Ok(NO_INFORMATION.to_string());
        }
        if code.is_empty() {
            return Ok(NO_CODE.to_string());
        }

        let query = career_query(code);
        let chunks = self.retriever.retrieve_text(&query, self.top_k).await?;
        let prompt = self.assembler.assemble(&query, &chunks);
        let answer = self.generator.generate(&prompt).await?;
        info!(
            "Generated recommendations for {} from {} chunks",
            code,
            chunks.len()
        );
        Ok(answer)
    }
}

use career_rag_retriever::retrieval::indexing_pipeline::IndexingPipeline;
use std::sync::Arc;

use crate::classifier::PersonalityClassifier;
use crate::workflow::AnalysisWorkflow;

/// Services shared by every request handler.
pub struct AppState {
    pub workflow: AnalysisWorkflow,
    pub pipeline: Arc<IndexingPipeline>,
    /// `None` when no classifier artifacts were found at startup
    pub classifier: Option<PersonalityClassifier>,
}

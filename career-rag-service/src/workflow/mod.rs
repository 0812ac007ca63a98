//! The complete analysis workflow.
//!
//! ## Pipeline Flow
//!
//! ```text
//! rag → learning → jobs → email → report
//! ```
//!
//! Steps run in this fixed order over one [`AnalysisState`]. Every step
//! degrades to a fallback value instead of failing, so a run always produces an
//! [`AnalysisReport`]:
//!
//! - **rag**: placeholder text, or `حدث خطأ: ...` on errors
//! - **learning**: the static university and course catalogues
//! - **jobs**: `{"error": ..., "jobs": []}`
//! - **email**: an [`EmailStatus`] other than `Sent`

pub mod email;
pub mod jobs;
pub mod learning;
pub mod rag;
pub mod state;

pub use state::{AnalysisReport, AnalysisRequest, AnalysisState, EmailStatus, StudentInfo};

use std::time::Instant;
use tracing::info;

use email::EmailStep;
use jobs::JobsStep;
use learning::LearningStep;
use rag::RagStep;

pub struct AnalysisWorkflow {
    rag: RagStep,
    learning: LearningStep,
    jobs: JobsStep,
    email: EmailStep,
}

impl AnalysisWorkflow {
    pub fn new(rag: RagStep, learning: LearningStep, jobs: JobsStep, email: EmailStep) -> Self {
        Self {
            rag,
            learning,
            jobs,
            email,
        }
    }

    pub async fn run(&self, request: AnalysisRequest) -> AnalysisReport {
        let started = Instant::now();
        info!(
            attempt_id = request.attempt_id,
            code = %request.personality_code,
            "Starting complete analysis"
        );
        let mut state = AnalysisState::new(request);

        self.rag.run(&mut state).await;
        self.learning.run(&mut state).await;
        self.jobs.run(&mut state).await;
        self.email.run(&mut state).await;

        let report = AnalysisReport::from(state);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            recommendations_chars = report.career_recommendations.chars().count(),
            learning_chars = report.learning_path.chars().count(),
            jobs = report.job_matches.jobs.len(),
            email_sent = report.email_sent(),
            "Complete analysis finished"
        );
        report
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::jobs::JobMatches;

/// Student details forwarded by the test platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: String,
}

/// Input of one complete analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub attempt_id: i64,
    /// Holland code such as `R-I-A`
    pub personality_code: String,
    pub student: StudentInfo,
    pub metric_scores: HashMap<String, i64>,
}

/// Outcome of the email step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailStatus {
    Sent { recipient: String },
    NoRecipient,
    NotConfigured,
    Failed { reason: String },
}

impl EmailStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, EmailStatus::Sent { .. })
    }
}

/// Values accumulated while the workflow steps run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisState {
    pub request: AnalysisRequest,
    pub career_recommendations: Option<String>,
    pub learning_path: Option<String>,
    pub job_matches: Option<JobMatches>,
    pub email_status: Option<EmailStatus>,
}

impl AnalysisState {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            request,
            career_recommendations: None,
            learning_path: None,
            job_matches: None,
            email_status: None,
        }
    }

    pub fn code(&self) -> &str {
        self.request.personality_code.trim()
    }
}

/// Final result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub personality_code: String,
    pub career_recommendations: String,
    pub learning_path: String,
    pub job_matches: JobMatches,
    pub email_status: EmailStatus,
}

impl AnalysisReport {
    pub fn email_sent(&self) -> bool {
        self.email_status.is_sent()
    }

    /// Job matches as a JSON string, non-ASCII characters kept as is.
    pub fn job_matches_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.job_matches)
    }
}

impl From<AnalysisState> for AnalysisReport {
    fn from(state: AnalysisState) -> Self {
        Self {
            personality_code: state.request.personality_code,
            career_recommendations: state.career_recommendations.unwrap_or_default(),
            learning_path: state.learning_path.unwrap_or_default(),
            job_matches: state.job_matches.unwrap_or_default(),
            email_status: state.email_status.unwrap_or(EmailStatus::NoRecipient),
        }
    }
}

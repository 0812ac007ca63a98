use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::errors::ApiError;
use super::state::AppState;
use crate::workflow::{AnalysisRequest, StudentInfo};

pub const SERVICE_NAME: &str = "Personality Test AI Service";

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "complete_analysis": "/api/ai/complete-analysis",
            "reindex": "/api/admin/reindex-documents",
            "predict_code": "/api/ml/predict-code"
        }
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let index_ready = matches!(state.pipeline.index().count().await, Ok(count) if count > 0);
    Json(json!({
        "status": "healthy",
        "service": "AI Analysis Service",
        "index_ready": index_ready,
        "classifier_loaded": state.classifier.is_some()
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAnalysisRequest {
    pub attempt_id: i64,
    pub personality_code: String,
    #[serde(default)]
    pub student_info: StudentInfo,
    #[serde(default)]
    pub metric_scores: HashMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAnalysisResponse {
    pub personality_code: String,
    pub career_recommendations: String,
    pub learning_path: String,
    /// JSON document `{"jobs": [...]}` or `{"error": ..., "jobs": []}`
    pub job_matches: String,
    pub email_sent: bool,
}

pub async fn complete_analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteAnalysisRequest>,
) -> Result<Json<CompleteAnalysisResponse>, ApiError> {
    info!(
        "Complete analysis requested: attempt {}, code {}",
        request.attempt_id, request.personality_code
    );
    let report = state
        .workflow
        .run(AnalysisRequest {
            attempt_id: request.attempt_id,
            personality_code: request.personality_code,
            student: request.student_info,
            metric_scores: request.metric_scores,
        })
        .await;

    Ok(Json(CompleteAnalysisResponse {
        job_matches: report.job_matches_json().map_err(ApiError::internal)?,
        email_sent: report.email_sent(),
        personality_code: report.personality_code,
        career_recommendations: report.career_recommendations,
        learning_path: report.learning_path,
    }))
}

pub async fn reindex_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .pipeline
        .clear_index()
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({
        "success": true,
        "message": "Index cleared. Next query will trigger reindexing.",
        "chunks_deleted": deleted
    })))
}

#[derive(Debug, Deserialize)]
pub struct PredictionRequest {
    pub answers: HashMap<String, Value>,
}

pub async fn predict_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let classifier = state.classifier.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("personality classifier is not configured".to_string())
    })?;
    if request.answers.is_empty() {
        return Err(ApiError::BadRequest("answers must not be empty".to_string()));
    }

    let answers: HashMap<String, String> = request
        .answers
        .into_iter()
        .map(|(question, answer)| {
            let text = match answer {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (question, text)
        })
        .collect();
    let code = classifier.predict(&answers);
    info!("Predicted personality code {}", code);
    Ok(Json(json!({ "predictedCode": code })))
}

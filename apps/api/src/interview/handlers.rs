use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::orchestrator::AnswerOutcome;
use crate::models::interview::{FeedbackReportRow, InterviewRecord};
use crate::state::AppState;

const DEFAULT_INTERVIEW_TYPE: &str = "technical";

fn default_interview_type() -> String {
    DEFAULT_INTERVIEW_TYPE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateInterviewRequest {
    #[serde(rename = "type", default = "default_interview_type")]
    pub interview_type: String,
    /// Client-chosen key; repeating it returns the same session.
    #[serde(default)]
    pub request_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    pub answer: String,
}

/// POST /api/v1/resumes/:id/interview
pub async fn handle_generate_interview(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    Json(req): Json<GenerateInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewRecord>), AppError> {
    let record = state
        .interviews
        .generate_questions(resume_id, &req.interview_type, req.request_key)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/resumes/:id/interview/history
pub async fn handle_interview_history(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<Vec<InterviewRecord>>, AppError> {
    Ok(Json(
        state.interviews.get_interview_history(resume_id).await?,
    ))
}

/// POST /api/v1/interview/answer
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    Ok(Json(
        state
            .interviews
            .evaluate_answer(req.question_id, &req.answer)
            .await?,
    ))
}

/// POST /api/v1/resumes/:id/feedback
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<(StatusCode, Json<FeedbackReportRow>), AppError> {
    let report = state.interviews.generate_feedback(resume_id).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/resumes/:id/feedback
pub async fn handle_latest_feedback(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
) -> Result<Json<FeedbackReportRow>, AppError> {
    Ok(Json(state.interviews.latest_feedback(resume_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_defaults() {
        let req: GenerateInterviewRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.interview_type, "technical");
        assert!(req.request_key.is_none());

        let req: GenerateInterviewRequest =
            serde_json::from_str(r#"{"type": "behavioral", "request_key": "k1"}"#).unwrap();
        assert_eq!(req.interview_type, "behavioral");
        assert_eq!(req.request_key.as_deref(), Some("k1"));
    }
}

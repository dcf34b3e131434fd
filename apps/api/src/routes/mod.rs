pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resumes
        .route("/api/v1/resumes", get(resume::handle_list_resumes))
        .route("/api/v1/resumes/upload", post(resume::handle_upload))
        .route(
            "/api/v1/resumes/:id",
            get(resume::handle_get_resume).delete(resume::handle_delete_resume),
        )
        .route("/api/v1/resumes/:id/info", get(resume::handle_resume_info))
        // Interviews
        .route(
            "/api/v1/resumes/:id/interview",
            post(interview::handle_generate_interview),
        )
        .route(
            "/api/v1/resumes/:id/interview/history",
            get(interview::handle_interview_history),
        )
        .route(
            "/api/v1/interview/answer",
            post(interview::handle_submit_answer),
        )
        .route(
            "/api/v1/resumes/:id/feedback",
            post(interview::handle_generate_feedback).get(interview::handle_latest_feedback),
        )
        .with_state(state)
}

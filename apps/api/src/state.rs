use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::interview::InterviewOrchestrator;
use crate::resume::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Used directly only by the health check; everything else goes through the stores.
    pub db: PgPool,
    pub config: Config,
    pub resumes: Arc<ResumeService>,
    pub interviews: Arc<InterviewOrchestrator>,
}

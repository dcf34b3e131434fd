mod config;
mod db;
mod document;
mod errors;
mod interview;
mod llm_client;
mod models;
mod resume;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::document::info::InfoExtractor;
use crate::interview::InterviewOrchestrator;
use crate::llm_client::retry::RetryingGenerator;
use crate::llm_client::ChatCompletionsClient;
use crate::resume::ResumeService;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

/// Headroom for multipart framing on top of the file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db.clone()));

    // Initialize LLM client, wrapped in the retry policy
    let client = ChatCompletionsClient::new(&config.llm)?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?}, max attempts: {})",
        client.model(),
        config.llm.timeout,
        config.retry.max_attempts
    );
    let llm = Arc::new(RetryingGenerator::new(client, config.retry));

    let resumes = Arc::new(ResumeService::new(
        store.clone(),
        config.upload_dir.clone(),
        config.upload_max_bytes,
        InfoExtractor::new(config.section_rules.clone()),
    ));
    let interviews = Arc::new(InterviewOrchestrator::new(
        store.clone(),
        store,
        llm,
        config.question_count,
    ));

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        resumes,
        interviews,
    };

    let body_limit = usize::try_from(config.upload_max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    // Build router
    let app = build_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use bookdesk::config::AppConfig;
use bookdesk::db;
use bookdesk::handlers;
use bookdesk::services::ai::gemini::GeminiProvider;
use bookdesk::services::knowledge::{KnowledgeBase, RagApiClient};
use bookdesk::services::notify::sendgrid::SendGridProvider;
use bookdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let conn = db::init_db(&config.database_url)?;

    if config.google_api_key.is_empty() {
        tracing::warn!("GOOGLE_API_KEY not set, question answering and llm extraction will fail");
    }
    tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
    let llm = GeminiProvider::new(
        config.google_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_api_url.clone(),
        timeout,
    );

    if config.sendgrid_api_key.is_empty() {
        tracing::warn!("SENDGRID_API_KEY not set, confirmation emails will fail");
    }
    let mailer = SendGridProvider::new(
        config.sendgrid_api_key.clone(),
        config.from_email.clone(),
        config.sendgrid_api_url.clone(),
        timeout,
    );

    let knowledge: Option<Box<dyn KnowledgeBase>> = match &config.rag_api_url {
        Some(url) => {
            tracing::info!("using retrieval API at {url}");
            Some(Box::new(RagApiClient::new(url.clone(), timeout)))
        }
        None => {
            tracing::warn!("RAG_API_URL not set, answering without knowledge base context");
            None
        }
    };

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        llm: Box::new(llm),
        mailer: Box::new(mailer),
        knowledge,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

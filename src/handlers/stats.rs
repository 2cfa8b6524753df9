use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::services::knowledge::KnowledgeStats;
use crate::state::AppState;

// GET /stats
pub async fn knowledge_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<KnowledgeStats>, AppError> {
    let kb = state
        .knowledge
        .as_ref()
        .ok_or_else(|| AppError::Config("RAG_API_URL is not configured".to_string()))?;

    let stats = kb.stats().await.map_err(AppError::transport)?;
    Ok(Json(stats))
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, BookingStats};
use crate::errors::AppError;
use crate::models::{BookingFilterQuery, BookingStatus, BookingView};
use crate::services::export::{self, ExportFormat};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingFilterQuery>,
) -> Result<Json<Vec<BookingView>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let filter = query.into_filter()?;
    let bookings = {
        let db = state.db();
        queries::list_bookings(&db, &filter)?
    };

    Ok(Json(bookings))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

// GET /api/admin/bookings/export?format=csv|json
pub async fn export_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingFilterQuery>,
    Query(export_query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let format = match export_query.format.as_deref() {
        None => ExportFormat::Csv,
        Some(f) => ExportFormat::parse(f)
            .ok_or_else(|| AppError::Validation(format!("unsupported export format: {f}")))?,
    };
    let filter = query.into_filter()?;

    let rows = {
        let db = state.db();
        queries::list_bookings(&db, &filter)?
    };
    let body = export::export_bookings(&rows, format)?;

    let filename = format!(
        "bookings_{}.{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    tracing::info!(rows = rows.len(), file = %filename, "bookings exported");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

// GET /api/admin/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingView>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db();
    Ok(Json(queries::get_booking_view(&db, &id)?))
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub id: String,
    pub status: BookingStatus,
    pub updated_at: String,
}

// POST /api/admin/bookings/:id/status
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let next = BookingStatus::parse(&payload.status)
        .ok_or_else(|| AppError::Validation(format!("unknown status: {}", payload.status)))?;

    let updated = {
        let mut db = state.db();
        queries::update_booking_status(&mut db, &id, next)?
    };

    Ok(Json(StatusUpdateResponse {
        id: updated.id,
        status: updated.status,
        updated_at: updated
            .updated_at
            .format(crate::models::booking::TIMESTAMP_FORMAT)
            .to_string(),
    }))
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BookingStats>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db();
    Ok(Json(queries::get_booking_stats(&db)?))
}

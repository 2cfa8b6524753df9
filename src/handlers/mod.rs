pub mod admin;
pub mod booking;
pub mod chat;
pub mod health;
pub mod stats;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/chat/:session_id", delete(chat::clear_chat))
        .route("/booking", post(booking::create_booking))
        .route("/booking/send-email", post(booking::send_confirmation))
        .route("/stats", get(stats::knowledge_stats))
        .route("/api/admin/bookings", get(admin::list_bookings))
        .route("/api/admin/bookings/export", get(admin::export_bookings))
        .route("/api/admin/bookings/:id", get(admin::get_booking))
        .route(
            "/api/admin/bookings/:id/status",
            post(admin::update_booking_status),
        )
        .route("/api/admin/stats", get(admin::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

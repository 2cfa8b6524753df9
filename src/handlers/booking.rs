use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::NewBooking;
use crate::services::assistant;
use crate::services::notify::{self, NotificationOutcome};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateBookingResponse {
    pub booking_id: String,
    pub customer_id: String,
    pub message: String,
    pub notification: NotificationOutcome,
}

// POST /booking
//
// The booking is committed before the confirmation is attempted; a failed
// send is reported in `notification` and leaves the booking as stored.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewBooking>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let (booking, customer) = {
        let mut db = state.db();
        queries::create_booking(&mut db, &payload)?
    };

    let result = notify::notify(state.mailer.as_ref(), &booking, &customer).await;
    let notification = NotificationOutcome::from_result(&customer.email, &result);

    let message = if notification.sent {
        "Booking created and confirmation email sent".to_string()
    } else {
        "Booking created, but the confirmation email could not be sent".to_string()
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_id: booking.id,
            customer_id: customer.id,
            message,
            notification,
        }),
    ))
}

/// Either `booking_id`, or a chat `session_id` whose last booking is
/// re-sent.
#[derive(Deserialize)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

// POST /booking/send-email
pub async fn send_confirmation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendEmailRequest>,
) -> Result<Json<NotificationOutcome>, AppError> {
    let booking_id = match non_blank(payload.booking_id.as_deref()) {
        Some(id) => id.to_string(),
        None => {
            let session_id = non_blank(payload.session_id.as_deref()).ok_or_else(|| {
                AppError::Validation("booking_id or session_id is required".to_string())
            })?;
            assistant::last_booking_id(&state, session_id)?.ok_or_else(|| {
                AppError::NotFound(format!("no booking in session {session_id}"))
            })?
        }
    };

    let (booking, customer) = {
        let db = state.db();
        queries::get_booking_with_customer(&db, &booking_id)?
    };

    let recipient = non_blank(payload.recipient_email.as_deref())
        .unwrap_or(&customer.email)
        .to_string();

    notify::notify_to(state.mailer.as_ref(), &booking, &customer, &recipient).await?;

    Ok(Json(NotificationOutcome {
        sent: true,
        recipient,
        error: None,
    }))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::{DATE_FORMAT, TIME_FORMAT};
use crate::models::{BookingDraft, BookingField, ChatMessage, DialogueState, Session};
use crate::services::ai::answer::answer_question;
use crate::services::ai::extract::extract_fields;
use crate::services::dialogue::{self, ParsedUtterance, TurnOutcome};
use crate::services::knowledge::format_context;
use crate::services::notify::{self, NotificationOutcome};
use crate::state::AppState;

/// Service type recorded for bookings taken through chat.
pub const CHAT_BOOKING_SERVICE: &str = "Reservation";

const MAX_HISTORY_EXCHANGES: usize = 20;
const KNOWLEDGE_TOP_K: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<BookingField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOutcome>,
}

struct Turn {
    reply: String,
    awaiting: Option<BookingField>,
    booking_id: Option<String>,
    notification: Option<NotificationOutcome>,
}

impl Turn {
    fn say(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            awaiting: None,
            booking_id: None,
            notification: None,
        }
    }

    fn ask(reply: String, field: BookingField) -> Self {
        Self {
            awaiting: Some(field),
            ..Self::say(reply)
        }
    }
}

pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> Result<ChatReply, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let mut session = {
        let db = state.db();
        let purged = queries::expire_old_sessions(&db)?;
        if purged > 0 {
            tracing::debug!(purged, "expired dialogue sessions removed");
        }
        queries::get_session(&db, session_id)?
    }
    .unwrap_or_else(|| new_session(session_id));

    let turn = match session.dialogue.take() {
        Some(_) if dialogue::is_cancel_request(message) => {
            tracing::info!(session = session_id, "booking form cancelled");
            Turn::say("No problem, I've dropped that booking request. Is there anything else I can help you with?")
        }
        Some(form) => continue_form(state, &mut session, form, message).await?,
        None => {
            let parsed = dialogue::parse_utterance(message, None, false);
            if dialogue::is_booking_intent(message) || parsed.values.len() >= 2 {
                tracing::info!(session = session_id, fields = parsed.values.len(), "booking form started");
                start_form(state, &mut session, parsed).await?
            } else {
                answer(state, &session, message).await
            }
        }
    };

    session.messages.push(ChatMessage::user(message));
    session.messages.push(ChatMessage::assistant(&turn.reply));
    trim_history(&mut session.messages);

    let now = Utc::now().naive_utc();
    session.last_activity = now;
    session.expires_at = queries::session_expiry(now);
    if turn.booking_id.is_some() {
        session.last_booking_id = turn.booking_id.clone();
    }

    {
        let db = state.db();
        queries::save_session(&db, &session)?;
    }

    Ok(ChatReply {
        session_id: session.session_id,
        reply: turn.reply,
        awaiting: turn.awaiting,
        booking_id: turn.booking_id,
        notification: turn.notification,
    })
}

/// Id of the most recent booking completed in a live session.
pub fn last_booking_id(state: &AppState, session_id: &str) -> Result<Option<String>, AppError> {
    let db = state.db();
    let session = queries::get_session(&db, session_id)?;
    Ok(session.and_then(|s| s.last_booking_id))
}

/// Drops a session's history and any in-progress form.
pub fn clear_session(state: &AppState, session_id: &str) -> Result<bool, AppError> {
    let db = state.db();
    let removed = queries::delete_session(&db, session_id)?;
    tracing::info!(session = session_id, removed, "session cleared");
    Ok(removed)
}

async fn start_form(
    state: &Arc<AppState>,
    session: &mut Session,
    parsed: ParsedUtterance,
) -> Result<Turn, AppError> {
    let mut form = DialogueState::new();
    if parsed.values.is_empty() {
        let field = form.pointer().unwrap_or(BookingField::Name);
        session.dialogue = Some(form);
        return Ok(Turn::ask(
            format!("I'd be happy to help you make a booking. {}", field.prompt()),
            field,
        ));
    }
    let outcome = dialogue::take_turn(&mut form, parsed);
    finish_turn(state, session, form, outcome).await
}

async fn continue_form(
    state: &Arc<AppState>,
    session: &mut Session,
    mut form: DialogueState,
    message: &str,
) -> Result<Turn, AppError> {
    let awaiting = form.pointer();
    let name_known = form.fields.name.is_some();
    let mut parsed = dialogue::parse_utterance(message, awaiting, name_known);

    if parsed.is_empty() {
        match extract_fields(state.llm.as_ref(), &session.messages, message, awaiting).await {
            Ok(fields) if fields.is_empty() => {
                tracing::debug!(session = %session.session_id, "llm found no booking fields");
            }
            Ok(fields) => {
                parsed = ParsedUtterance::from_extracted(&fields);
                tracing::debug!(
                    session = %session.session_id,
                    found = parsed.values.len(),
                    "llm field extraction"
                );
            }
            Err(e) => {
                tracing::warn!(session = %session.session_id, error = %e, "llm field extraction failed");
            }
        }
    }

    let outcome = dialogue::take_turn(&mut form, parsed);
    finish_turn(state, session, form, outcome).await
}

async fn finish_turn(
    state: &Arc<AppState>,
    session: &mut Session,
    form: DialogueState,
    outcome: TurnOutcome,
) -> Result<Turn, AppError> {
    let reply = dialogue::ask_reply(&outcome);
    match outcome {
        TurnOutcome::Complete { draft, .. } => {
            let turn = complete_booking(state, draft).await?;
            session.dialogue = None;
            Ok(turn)
        }
        TurnOutcome::Ask { field, .. } => {
            let reply = reply.unwrap_or_else(|| field.prompt().to_string());
            tracing::debug!(session = %session.session_id, awaiting = field.as_str(), "booking form updated");
            session.dialogue = Some(form);
            Ok(Turn::ask(reply, field))
        }
    }
}

/// Stores the finished form and makes the single confirmation attempt.
async fn complete_booking(state: &Arc<AppState>, draft: BookingDraft) -> Result<Turn, AppError> {
    let input = draft.into_new_booking(CHAT_BOOKING_SERVICE);
    let (booking, customer) = {
        let mut db = state.db();
        queries::create_booking(&mut db, &input)?
    };

    let result = notify::notify(state.mailer.as_ref(), &booking, &customer).await;
    let notification = NotificationOutcome::from_result(&customer.email, &result);

    let mut reply = format!(
        "Your booking is in! Here are the details:\n\
         - Booking ID: {}\n\
         - Name: {}\n\
         - Date: {}\n\
         - Time: {}\n\
         - Party size: {}\n\
         - Status: {}\n",
        booking.id,
        customer.name,
        booking.date.format(DATE_FORMAT),
        booking.time.format(TIME_FORMAT),
        booking.party_size,
        booking.status.as_str(),
    );
    if notification.sent {
        reply.push_str(&format!("A confirmation email has been sent to {}.", customer.email));
    } else {
        reply.push_str(
            "I couldn't send the confirmation email just now, but your booking has been saved.",
        );
    }

    Ok(Turn {
        reply,
        awaiting: None,
        booking_id: Some(booking.id),
        notification: Some(notification),
    })
}

async fn answer(state: &Arc<AppState>, session: &Session, message: &str) -> Turn {
    let context = match &state.knowledge {
        Some(kb) => match kb.search(message, KNOWLEDGE_TOP_K).await {
            Ok(hits) if !hits.is_empty() => Some(format_context(&hits)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(session = %session.session_id, error = %e, "knowledge search failed");
                None
            }
        },
        None => None,
    };

    match answer_question(state.llm.as_ref(), &session.messages, message, context.as_deref()).await
    {
        Ok(reply) if !reply.is_empty() => Turn::say(reply),
        Ok(_) => Turn::say("I'm not sure how to answer that. Would you like to make a booking?"),
        Err(e) => {
            tracing::error!(session = %session.session_id, error = %e, "llm answer failed");
            Turn::say("Sorry, I'm having trouble answering right now. Please try again in a moment.")
        }
    }
}

fn new_session(session_id: &str) -> Session {
    let now = Utc::now().naive_utc();
    Session {
        session_id: session_id.to_string(),
        messages: vec![],
        dialogue: None,
        last_booking_id: None,
        last_activity: now,
        expires_at: queries::session_expiry(now),
    }
}

/// Keeps the most recent exchanges (one user and one assistant message each).
fn trim_history(messages: &mut Vec<ChatMessage>) {
    let max = MAX_HISTORY_EXCHANGES * 2;
    if messages.len() > max {
        messages.drain(..messages.len() - max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_history_keeps_latest_exchanges() {
        let mut messages: Vec<ChatMessage> = (0..50)
            .flat_map(|i| {
                [
                    ChatMessage::user(&format!("q{i}")),
                    ChatMessage::assistant(&format!("a{i}")),
                ]
            })
            .collect();
        trim_history(&mut messages);
        assert_eq!(messages.len(), 40);
        assert_eq!(messages[0].content, "q30");
        assert_eq!(messages[39].content, "a49");
    }

    #[test]
    fn test_trim_history_short_untouched() {
        let mut messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        trim_history(&mut messages);
        assert_eq!(messages.len(), 2);
    }
}

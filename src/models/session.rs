use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::DialogueState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// What is stored in the `data` column of `dialogue_sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub dialogue: Option<DialogueState>,
    #[serde(default)]
    pub last_booking_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub dialogue: Option<DialogueState>,
    pub last_booking_id: Option<String>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

//! Booking form state carried across conversation turns.
//!
//! The form is a small finite-state machine: it is either awaiting one of the
//! required fields or complete. The step is always recomputed from the
//! collected values, so it can only ever name the first field still unset.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::{NewBooking, DATE_FORMAT, TIME_FORMAT};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BookingField {
    Name,
    Date,
    Time,
    PartySize,
    Email,
}

impl BookingField {
    /// Order in which fields are requested.
    pub const ORDER: [BookingField; 5] = [
        BookingField::Name,
        BookingField::Date,
        BookingField::Time,
        BookingField::PartySize,
        BookingField::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingField::Name => "name",
            BookingField::Date => "date",
            BookingField::Time => "time",
            BookingField::PartySize => "party_size",
            BookingField::Email => "email",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingField::Name => "name",
            BookingField::Date => "date",
            BookingField::Time => "time",
            BookingField::PartySize => "party size",
            BookingField::Email => "email address",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            BookingField::Name => "May I have your full name?",
            BookingField::Date => "What date would you like? (YYYY-MM-DD)",
            BookingField::Time => "What time works for you? (HH:MM, 24-hour)",
            BookingField::PartySize => "How many people will there be?",
            BookingField::Email => "What email address should I send the confirmation to?",
        }
    }

    pub fn reprompt(&self) -> &'static str {
        match self {
            BookingField::Name => "Sorry, I didn't catch your name. Could you tell me your full name?",
            BookingField::Date => {
                "Sorry, I couldn't read that date. Please use the YYYY-MM-DD format, e.g. 2025-01-21."
            }
            BookingField::Time => {
                "Sorry, I couldn't read that time. Please use HH:MM in 24-hour format, e.g. 14:30."
            }
            BookingField::PartySize => "Sorry, how many people? Please give a number from 1 to 20.",
            BookingField::Email => {
                "That doesn't look like a valid email address. Could you check it and send it again?"
            }
        }
    }
}

/// A single parsed and validated value for one of the required fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Name(String),
    Date(NaiveDate),
    Time(NaiveTime),
    PartySize(u32),
    Email(String),
}

impl FieldValue {
    pub fn field(&self) -> BookingField {
        match self {
            FieldValue::Name(_) => BookingField::Name,
            FieldValue::Date(_) => BookingField::Date,
            FieldValue::Time(_) => BookingField::Time,
            FieldValue::PartySize(_) => BookingField::PartySize,
            FieldValue::Email(_) => BookingField::Email,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectedFields {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub party_size: Option<u32>,
    pub email: Option<String>,
}

impl CollectedFields {
    pub fn is_set(&self, field: BookingField) -> bool {
        match field {
            BookingField::Name => self.name.is_some(),
            BookingField::Date => self.date.is_some(),
            BookingField::Time => self.time.is_some(),
            BookingField::PartySize => self.party_size.is_some(),
            BookingField::Email => self.email.is_some(),
        }
    }

    fn set(&mut self, value: FieldValue) {
        match value {
            FieldValue::Name(v) => self.name = Some(v),
            FieldValue::Date(v) => self.date = Some(v),
            FieldValue::Time(v) => self.time = Some(v),
            FieldValue::PartySize(v) => self.party_size = Some(v),
            FieldValue::Email(v) => self.email = Some(v),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", content = "field", rename_all = "snake_case")]
pub enum DialogueStep {
    Awaiting(BookingField),
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DialogueState {
    pub fields: CollectedFields,
    pub step: DialogueStep,
    pub started_at: NaiveDateTime,
}

/// Every required field collected, ready to become a booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub email: String,
}

impl BookingDraft {
    pub fn into_new_booking(self, service: &str) -> NewBooking {
        NewBooking {
            name: self.name,
            email: self.email,
            phone: None,
            service: service.to_string(),
            date: self.date.format(DATE_FORMAT).to_string(),
            time: self.time.format(TIME_FORMAT).to_string(),
            party_size: Some(self.party_size),
            status: None,
        }
    }
}

impl Default for DialogueState {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogueState {
    pub fn new() -> Self {
        Self {
            fields: CollectedFields::default(),
            step: DialogueStep::Awaiting(BookingField::Name),
            started_at: Utc::now().naive_utc(),
        }
    }

    /// First unset field in request order, or `None` once complete.
    pub fn pointer(&self) -> Option<BookingField> {
        BookingField::ORDER
            .into_iter()
            .find(|f| !self.fields.is_set(*f))
    }

    /// Records a value (later values for the same field replace earlier
    /// ones) and moves the step to the first field still unset.
    pub fn record(&mut self, value: FieldValue) -> BookingField {
        let field = value.field();
        self.fields.set(value);
        self.step = match self.pointer() {
            Some(next) => DialogueStep::Awaiting(next),
            None => DialogueStep::Complete,
        };
        field
    }

    pub fn is_complete(&self) -> bool {
        self.step == DialogueStep::Complete
    }

    pub fn draft(&self) -> Option<BookingDraft> {
        let f = &self.fields;
        Some(BookingDraft {
            name: f.name.clone()?,
            date: f.date?,
            time: f.time?,
            party_size: f.party_size?,
            email: f.email.clone()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_awaits_name() {
        let state = DialogueState::new();
        assert_eq!(state.step, DialogueStep::Awaiting(BookingField::Name));
        assert_eq!(state.pointer(), Some(BookingField::Name));
        assert!(state.draft().is_none());
    }

    #[test]
    fn test_later_field_does_not_move_pointer() {
        let mut state = DialogueState::new();
        state.record(FieldValue::Email("mary@example.com".to_string()));
        assert_eq!(state.step, DialogueStep::Awaiting(BookingField::Name));

        state.record(FieldValue::Name("Mary".to_string()));
        assert_eq!(state.step, DialogueStep::Awaiting(BookingField::Date));
    }

    #[test]
    fn test_complete_after_all_fields() {
        let mut state = DialogueState::new();
        state.record(FieldValue::PartySize(4));
        state.record(FieldValue::Name("Mary".to_string()));
        state.record(FieldValue::Time(NaiveTime::from_hms_opt(14, 0, 0).unwrap()));
        state.record(FieldValue::Email("mary@example.com".to_string()));
        assert_eq!(state.step, DialogueStep::Awaiting(BookingField::Date));
        state.record(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
        assert!(state.is_complete());

        let booking = state.draft().unwrap().into_new_booking("Table");
        assert_eq!(booking.date, "2024-05-01");
        assert_eq!(booking.time, "14:00");
        assert_eq!(booking.party_size, Some(4));
    }

    #[test]
    fn test_step_serializes_tagged() {
        let json = serde_json::to_value(DialogueStep::Awaiting(BookingField::PartySize)).unwrap();
        assert_eq!(json, serde_json::json!({"step": "awaiting", "field": "party_size"}));
        let back: DialogueStep =
            serde_json::from_value(serde_json::json!({"step": "complete"})).unwrap();
        assert_eq!(back, DialogueStep::Complete);
    }
}

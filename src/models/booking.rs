use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::customer::is_valid_email;

pub const MAX_PARTY_SIZE: u32 = 20;
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub id: String,
    pub customer_id: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Cancelled is terminal and a confirmed booking never goes back to pending.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

/// A booking joined with the customer it belongs to. This is the row shape
/// used by listings and exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingView {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub service: String,
    pub date: String,
    pub time: String,
    pub party_size: u32,
    pub status: BookingStatus,
    pub created_at: String,
}

/// Unvalidated input for a new booking, as it arrives from the router or
/// from a completed dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBooking {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "booking_type")]
    pub service: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub party_size: Option<u32>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub status: BookingStatus,
}

impl NewBooking {
    pub fn validate(&self) -> Result<ValidBooking, AppError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.service.trim().is_empty() {
            missing.push("service");
        }
        if self.date.trim().is_empty() {
            missing.push("date");
        }
        if self.time.trim().is_empty() {
            missing.push("time");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::Validation(format!(
                "malformed email address: {}",
                self.email.trim()
            )));
        }

        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).map_err(|_| {
            AppError::Validation(format!("date must be YYYY-MM-DD, got {}", self.date.trim()))
        })?;
        let time = NaiveTime::parse_from_str(self.time.trim(), TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(self.time.trim(), "%H:%M:%S"))
            .map_err(|_| {
                AppError::Validation(format!("time must be HH:MM, got {}", self.time.trim()))
            })?;

        let party_size = self.party_size.unwrap_or(1);
        if party_size == 0 || party_size > MAX_PARTY_SIZE {
            return Err(AppError::Validation(format!(
                "party size must be between 1 and {MAX_PARTY_SIZE}"
            )));
        }

        let status = self.status.unwrap_or(BookingStatus::Pending);
        if status == BookingStatus::Cancelled {
            return Err(AppError::Validation(
                "a booking cannot be created as cancelled".to_string(),
            ));
        }

        Ok(ValidBooking {
            name: self.name.trim().to_string(),
            email,
            phone: self
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            service: self.service.trim().to_string(),
            date,
            time,
            party_size,
            status,
        })
    }
}

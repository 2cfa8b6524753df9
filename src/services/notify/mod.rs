pub mod sendgrid;
pub mod template;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{BookingRecord, CustomerRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Result of the single notification attempt made after a booking is
/// stored. A failure never affects the stored booking.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationOutcome {
    pub sent: bool,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn from_result(recipient: &str, result: &Result<(), AppError>) -> Self {
        Self {
            sent: result.is_ok(),
            recipient: recipient.to_string(),
            error: result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// Sends the booking confirmation to the customer's address.
pub async fn notify(
    mailer: &dyn EmailProvider,
    booking: &BookingRecord,
    customer: &CustomerRecord,
) -> Result<(), AppError> {
    notify_to(mailer, booking, customer, &customer.email).await
}

/// Sends the booking confirmation to an explicit address. Exactly one send
/// attempt is made; there is no retry.
pub async fn notify_to(
    mailer: &dyn EmailProvider,
    booking: &BookingRecord,
    customer: &CustomerRecord,
    recipient: &str,
) -> Result<(), AppError> {
    let recipient = recipient.trim();
    if !crate::models::customer::is_valid_email(recipient) {
        return Err(AppError::Validation(format!(
            "cannot send confirmation to malformed address: {recipient}"
        )));
    }

    let message = template::confirmation_email(booking, customer, recipient);

    match mailer.send_email(&message).await {
        Ok(()) => {
            tracing::info!(booking_id = %booking.id, to = recipient, "confirmation email sent");
            Ok(())
        }
        Err(e) => {
            tracing::error!(booking_id = %booking.id, to = recipient, error = %e, "confirmation email failed");
            Err(AppError::transport(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;
    use crate::models::BookingStatus;

    struct RecordingMailer {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailProvider for RecordingMailer {
        async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(())
        }
    }

    fn fixtures(email: &str) -> (BookingRecord, CustomerRecord) {
        let now = Utc::now().naive_utc();
        let customer = CustomerRecord {
            id: "c1".to_string(),
            name: "Mary".to_string(),
            email: email.to_string(),
            phone: None,
            created_at: now,
        };
        let booking = BookingRecord {
            id: "b1".to_string(),
            customer_id: "c1".to_string(),
            service: "Dinner".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            party_size: 4,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        (booking, customer)
    }

    #[tokio::test]
    async fn test_notify_sends_once() {
        let mailer = RecordingMailer {
            sent: Mutex::new(vec![]),
            fail: false,
        };
        let (booking, customer) = fixtures("mary@example.com");
        notify(&mailer, &booking, &customer).await.unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "mary@example.com");
        assert_eq!(sent[0].subject, "Booking Confirmation - Dinner");
    }

    #[tokio::test]
    async fn test_notify_transport_failure() {
        let mailer = RecordingMailer {
            sent: Mutex::new(vec![]),
            fail: true,
        };
        let (booking, customer) = fixtures("mary@example.com");
        let result = notify(&mailer, &booking, &customer).await;
        assert!(matches!(result, Err(AppError::Transport(ref m)) if m.contains("connection reset")));
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);

        let outcome = NotificationOutcome::from_result(&customer.email, &result);
        assert!(!outcome.sent);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_notify_rejects_malformed_email_without_sending() {
        let mailer = RecordingMailer {
            sent: Mutex::new(vec![]),
            fail: false,
        };
        let (booking, customer) = fixtures("not-an-address");
        let result = notify(&mailer, &booking, &customer).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}

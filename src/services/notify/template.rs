use crate::models::booking::{DATE_FORMAT, TIME_FORMAT};
use crate::models::{BookingRecord, CustomerRecord};

use super::EmailMessage;

pub fn confirmation_email(
    booking: &BookingRecord,
    customer: &CustomerRecord,
    recipient: &str,
) -> EmailMessage {
    let name = escape_html(&customer.name);
    let id = escape_html(&booking.id);
    let service = escape_html(&booking.service);
    let date = booking.date.format(DATE_FORMAT);
    let time = booking.time.format(TIME_FORMAT);
    let party_size = booking.party_size;
    let status = booking.status.as_str();

    let html = format!(
        "<html>\n\
         <body style=\"font-family: Arial, sans-serif;\">\n\
         <h2>Booking Confirmation</h2>\n\
         <p>Dear {name},</p>\n\
         <p>Your booking has been received with the following details:</p>\n\
         <ul>\n\
         <li><strong>Booking ID:</strong> {id}</li>\n\
         <li><strong>Type:</strong> {service}</li>\n\
         <li><strong>Date:</strong> {date}</li>\n\
         <li><strong>Time:</strong> {time}</li>\n\
         <li><strong>Party size:</strong> {party_size}</li>\n\
         <li><strong>Status:</strong> {status}</li>\n\
         </ul>\n\
         <p>If you have any questions, please contact us.</p>\n\
         <p>Thank you!</p>\n\
         </body>\n\
         </html>\n"
    );

    EmailMessage {
        to: recipient.to_string(),
        subject: format!("Booking Confirmation - {}", booking.service),
        html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

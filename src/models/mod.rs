pub mod booking;
pub mod customer;
pub mod dialogue;
pub mod filter;
pub mod intent;
pub mod session;

pub use booking::{BookingRecord, BookingStatus, BookingView, NewBooking, ValidBooking};
pub use customer::CustomerRecord;
pub use dialogue::{BookingDraft, BookingField, DialogueState, DialogueStep, FieldValue};
pub use filter::{BookingFilter, BookingFilterQuery};
pub use intent::ExtractedFields;
pub use session::{ChatMessage, Session, SessionData};

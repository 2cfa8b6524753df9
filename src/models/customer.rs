use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@,;]+@[^\s@,;]+\.[^\s@,;.]+$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("mary@example.com"));
        assert!(is_valid_email("a.b+tag@mail.example.co.uk"));
        assert!(!is_valid_email("mary@example"));
        assert!(!is_valid_email("mary example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("mary@example."));
    }
}

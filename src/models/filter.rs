use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::booking::DATE_FORMAT;
use crate::models::BookingStatus;

/// Optional predicates for listing bookings. Unset predicates match
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub name_contains: Option<String>,
    pub email_contains: Option<String>,
    pub limit: Option<i64>,
}

/// Query-string form of [`BookingFilter`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilterQuery {
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub customer_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
}

impl BookingFilterQuery {
    pub fn into_filter(self) -> Result<BookingFilter, AppError> {
        let status = match non_empty(self.status) {
            Some(s) => Some(
                BookingStatus::parse(&s)
                    .ok_or_else(|| AppError::Validation(format!("unknown status: {s}")))?,
            ),
            None => None,
        };

        Ok(BookingFilter {
            status,
            date_from: parse_date(non_empty(self.date_from), "date_from")?,
            date_to: parse_date(non_empty(self.date_to), "date_to")?,
            customer_id: non_empty(self.customer_id),
            name_contains: non_empty(self.name),
            email_contains: non_empty(self.email),
            limit: self.limit.filter(|l| *l > 0),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(value: Option<String>, param: &str) -> Result<Option<NaiveDate>, AppError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, DATE_FORMAT)
                .map_err(|_| AppError::Validation(format!("{param} must be YYYY-MM-DD, got {v}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let query = BookingFilterQuery {
            status: Some("Confirmed".to_string()),
            date_from: Some("2024-05-01".to_string()),
            date_to: Some("".to_string()),
            name: Some("  mar ".to_string()),
            limit: Some(0),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(BookingStatus::Confirmed));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(filter.date_to, None);
        assert_eq!(filter.name_contains.as_deref(), Some("mar"));
        assert_eq!(filter.limit, None);
    }

    #[test]
    fn test_query_rejects_unknown_status() {
        let query = BookingFilterQuery {
            status: Some("archived".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::Validation(_))));
    }
}

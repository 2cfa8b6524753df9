//! CSV and JSON renderings of the booking listing.

use crate::errors::AppError;
use crate::models::{BookingStatus, BookingView};

const CSV_HEADER: [&str; 11] = [
    "id",
    "customer_id",
    "customer_name",
    "customer_email",
    "customer_phone",
    "service",
    "date",
    "time",
    "party_size",
    "status",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

pub fn export_bookings(rows: &[BookingView], format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
        ExportFormat::Csv => Ok(to_csv(rows).into_bytes()),
    }
}

fn to_csv(rows: &[BookingView]) -> String {
    let mut out = String::new();
    write_record(&mut out, CSV_HEADER.iter().copied());
    for row in rows {
        let party_size = row.party_size.to_string();
        write_record(
            &mut out,
            [
                row.id.as_str(),
                row.customer_id.as_str(),
                row.customer_name.as_str(),
                row.customer_email.as_str(),
                row.customer_phone.as_deref().unwrap_or(""),
                row.service.as_str(),
                row.date.as_str(),
                row.time.as_str(),
                party_size.as_str(),
                row.status.as_str(),
                row.created_at.as_str(),
            ],
        );
    }
    out
}

fn write_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

/// Reads a CSV produced by [`export_bookings`] back into rows.
pub fn import_csv(bytes: &[u8]) -> Result<Vec<BookingView>, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Validation(format!("CSV is not valid UTF-8: {e}")))?;
    let mut records = parse_csv(text)?.into_iter();

    let header = records
        .next()
        .ok_or_else(|| AppError::Validation("CSV is empty".to_string()))?;
    if header != CSV_HEADER {
        return Err(AppError::Validation(format!(
            "unexpected CSV header: {}",
            header.join(",")
        )));
    }

    records
        .enumerate()
        .map(|(i, record)| row_from_record(i + 2, record))
        .collect()
}

fn row_from_record(line: usize, record: Vec<String>) -> Result<BookingView, AppError> {
    let [id, customer_id, customer_name, customer_email, customer_phone, service, date, time, party_size, status, created_at]: [String; 11] =
        record.try_into().map_err(|r: Vec<String>| {
            AppError::Validation(format!("record {line}: expected 11 fields, got {}", r.len()))
        })?;

    let party_size = party_size
        .parse()
        .map_err(|_| AppError::Validation(format!("record {line}: bad party_size {party_size:?}")))?;
    let status = BookingStatus::parse(&status)
        .ok_or_else(|| AppError::Validation(format!("record {line}: bad status {status:?}")))?;

    Ok(BookingView {
        id,
        customer_id,
        customer_name,
        customer_email,
        customer_phone: (!customer_phone.is_empty()).then_some(customer_phone),
        service,
        date,
        time,
        party_size,
        status,
        created_at,
    })
}

/// RFC 4180 reader: quoted fields may contain separators, doubled quotes and
/// line breaks. Accepts both CRLF and LF record endings.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, AppError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::Validation("CSV ends inside a quoted field".to_string()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str, name: &str, phone: Option<&str>, status: BookingStatus) -> BookingView {
        BookingView {
            id: id.to_string(),
            customer_id: format!("cust-{id}"),
            customer_name: name.to_string(),
            customer_email: "guest@example.com".to_string(),
            customer_phone: phone.map(str::to_string),
            service: "Dinner, window seat".to_string(),
            date: "2024-05-01".to_string(),
            time: "14:00".to_string(),
            party_size: 4,
            status,
            created_at: "2024-04-20 09:15:00".to_string(),
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let rows = vec![
            view("b1", "Mary \"May\" O'Neil", Some("+1 555 0100"), BookingStatus::Pending),
            view("b2", "Line\nBreak, Esq.", None, BookingStatus::Cancelled),
            view("b3", "Plain", Some(""), BookingStatus::Confirmed),
        ];
        let bytes = export_bookings(&rows, ExportFormat::Csv).unwrap();
        let back = import_csv(&bytes).unwrap();

        assert_eq!(back.len(), 3);
        assert_eq!(back[0], rows[0]);
        assert_eq!(back[1], rows[1]);
        // An empty phone reads back as absent.
        assert_eq!(back[2].customer_phone, None);
        assert_eq!(back[2].customer_name, "Plain");
    }

    #[test]
    fn test_csv_quoting() {
        let rows = vec![view("b1", "A \"B\"", None, BookingStatus::Pending)];
        let csv = String::from_utf8(export_bookings(&rows, ExportFormat::Csv).unwrap()).unwrap();
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next().unwrap(),
            "id,customer_id,customer_name,customer_email,customer_phone,service,date,time,party_size,status,created_at"
        );
        assert_eq!(
            lines.next().unwrap(),
            "b1,cust-b1,\"A \"\"B\"\"\",guest@example.com,,\"Dinner, window seat\",2024-05-01,14:00,4,pending,2024-04-20 09:15:00"
        );
    }

    #[test]
    fn test_json_export_is_array() {
        let rows = vec![view("b1", "Mary", None, BookingStatus::Confirmed)];
        let bytes = export_bookings(&rows, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value[0]["id"], "b1");
        assert_eq!(value[0]["status"], "confirmed");

        let empty = export_bookings(&[], ExportFormat::Json).unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&empty).unwrap(), serde_json::json!([]));
    }

    #[test]
    fn test_import_rejects_bad_input() {
        assert!(matches!(import_csv(b""), Err(AppError::Validation(_))));
        assert!(matches!(import_csv(b"a,b\r\n"), Err(AppError::Validation(_))));

        let mut csv = CSV_HEADER.join(",");
        csv.push_str("\r\nb1,c1,Mary,m@x.io,,Dinner,2024-05-01,14:00,four,pending,now\r\n");
        assert!(matches!(import_csv(csv.as_bytes()), Err(AppError::Validation(_))));

        let unterminated = format!("{}\r\n\"b1", CSV_HEADER.join(","));
        assert!(matches!(import_csv(unterminated.as_bytes()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse("xml"), None);
    }
}

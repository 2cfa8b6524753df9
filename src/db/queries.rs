use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::booking::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use crate::models::{
    BookingFilter, BookingRecord, BookingStatus, BookingView, CustomerRecord, NewBooking, Session,
    SessionData,
};

pub const SESSION_TTL_MINUTES: i64 = 30;

// ── Sessions ──

pub fn get_session(conn: &Connection, session_id: &str) -> anyhow::Result<Option<Session>> {
    let now = now_string();
    let result = conn
        .query_row(
            "SELECT session_id, data, updated_at, expires_at FROM dialogue_sessions
             WHERE session_id = ?1 AND expires_at > ?2",
            params![session_id, now],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((session_id, data_json, updated_at, expires_at)) = result else {
        return Ok(None);
    };

    let data: SessionData = serde_json::from_str(&data_json).unwrap_or_else(|e| {
        tracing::warn!(session = %session_id, error = %e, "unreadable session data, starting fresh");
        SessionData::default()
    });

    let last_activity = NaiveDateTime::parse_from_str(&updated_at, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let expires_at = NaiveDateTime::parse_from_str(&expires_at, TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Some(Session {
        session_id,
        messages: data.messages,
        dialogue: data.dialogue,
        last_booking_id: data.last_booking_id,
        last_activity,
        expires_at,
    }))
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let data = SessionData {
        messages: session.messages.clone(),
        dialogue: session.dialogue.clone(),
        last_booking_id: session.last_booking_id.clone(),
    };
    let data_json = serde_json::to_string(&data)?;
    let updated_at = session.last_activity.format(TIMESTAMP_FORMAT).to_string();
    let expires_at = session.expires_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO dialogue_sessions (session_id, data, updated_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(session_id) DO UPDATE SET
           data = excluded.data,
           updated_at = excluded.updated_at,
           expires_at = excluded.expires_at",
        params![session.session_id, data_json, updated_at, expires_at],
    )?;
    Ok(())
}

pub fn delete_session(conn: &Connection, session_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM dialogue_sessions WHERE session_id = ?1",
        params![session_id],
    )?;
    Ok(count > 0)
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM dialogue_sessions WHERE expires_at <= ?1",
        params![now_string()],
    )?;
    Ok(count)
}

pub fn session_expiry(from: NaiveDateTime) -> NaiveDateTime {
    from + Duration::minutes(SESSION_TTL_MINUTES)
}

// ── Bookings ──

/// Validates the input, upserts the customer by email and inserts the
/// booking, all inside one immediate transaction.
pub fn create_booking(
    conn: &mut Connection,
    input: &NewBooking,
) -> Result<(BookingRecord, CustomerRecord), AppError> {
    let valid = input.validate()?;
    let now = Utc::now().naive_utc();
    let now = now.with_nanosecond(0).unwrap_or(now);
    let now_str = now.format(TIMESTAMP_FORMAT).to_string();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO customers (id, name, email, phone, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(email) DO UPDATE SET
           name = excluded.name,
           phone = COALESCE(excluded.phone, customers.phone)",
        params![
            uuid::Uuid::new_v4().to_string(),
            valid.name,
            valid.email,
            valid.phone,
            now_str,
        ],
    )?;

    let customer = tx.query_row(
        "SELECT id, name, email, phone, created_at FROM customers WHERE email = ?1",
        params![valid.email],
        parse_customer_row,
    )?;

    let booking = BookingRecord {
        id: uuid::Uuid::new_v4().to_string(),
        customer_id: customer.id.clone(),
        service: valid.service,
        date: valid.date,
        time: valid.time,
        party_size: valid.party_size,
        status: valid.status,
        created_at: now,
        updated_at: now,
    };

    tx.execute(
        "INSERT INTO bookings (id, customer_id, service, date, time, party_size, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.customer_id,
            booking.service,
            booking.date.format(DATE_FORMAT).to_string(),
            booking.time.format(TIME_FORMAT).to_string(),
            booking.party_size,
            booking.status.as_str(),
            now_str,
            now_str,
        ],
    )?;

    tx.commit()?;

    tracing::info!(
        booking_id = %booking.id,
        customer_id = %customer.id,
        status = booking.status.as_str(),
        "booking created"
    );

    Ok((booking, customer))
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Option<BookingRecord>, AppError> {
    let booking = conn
        .query_row(
            "SELECT id, customer_id, service, date, time, party_size, status, created_at, updated_at
             FROM bookings WHERE id = ?1",
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_customer(conn: &Connection, id: &str) -> Result<Option<CustomerRecord>, AppError> {
    let customer = conn
        .query_row(
            "SELECT id, name, email, phone, created_at FROM customers WHERE id = ?1",
            params![id],
            parse_customer_row,
        )
        .optional()?;
    Ok(customer)
}

pub fn get_booking_with_customer(
    conn: &Connection,
    id: &str,
) -> Result<(BookingRecord, CustomerRecord), AppError> {
    let booking =
        get_booking(conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    let customer = get_customer(conn, &booking.customer_id)?
        .ok_or_else(|| AppError::NotFound(format!("customer {}", booking.customer_id)))?;
    Ok((booking, customer))
}

pub fn get_booking_view(conn: &Connection, id: &str) -> Result<BookingView, AppError> {
    let view = conn
        .query_row(
            &format!("{VIEW_SELECT} WHERE b.id = ?1"),
            params![id],
            parse_view_row,
        )
        .optional()?;
    view.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

const VIEW_SELECT: &str = "SELECT b.id, b.customer_id, c.name, c.email, c.phone, b.service, b.date, b.time, \
     b.party_size, b.status, b.created_at \
     FROM bookings b JOIN customers c ON c.id = b.customer_id";

/// Bookings matching every set predicate, newest first.
pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> Result<Vec<BookingView>, AppError> {
    let mut clauses: Vec<&str> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(status) = filter.status {
        clauses.push("b.status = ?");
        params_vec.push(Box::new(status.as_str()));
    }
    if let Some(from) = filter.date_from {
        clauses.push("b.date >= ?");
        params_vec.push(Box::new(from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = filter.date_to {
        clauses.push("b.date <= ?");
        params_vec.push(Box::new(to.format(DATE_FORMAT).to_string()));
    }
    if let Some(customer_id) = &filter.customer_id {
        clauses.push("b.customer_id = ?");
        params_vec.push(Box::new(customer_id.clone()));
    }
    if let Some(name) = &filter.name_contains {
        clauses.push("LOWER(c.name) LIKE ? ESCAPE '\\'");
        params_vec.push(Box::new(like_pattern(name)));
    }
    if let Some(email) = &filter.email_contains {
        clauses.push("LOWER(c.email) LIKE ? ESCAPE '\\'");
        params_vec.push(Box::new(like_pattern(email)));
    }

    let mut sql = VIEW_SELECT.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY b.created_at DESC, b.rowid DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), parse_view_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// Applies a status change if the transition table allows it. The read and
/// the write happen in one immediate transaction so concurrent updates to
/// the same booking are serialized.
pub fn update_booking_status(
    conn: &mut Connection,
    id: &str,
    next: BookingStatus,
) -> Result<BookingRecord, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = get_booking(&tx, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if !current.status.can_transition_to(next) {
        return Err(AppError::InvalidTransition {
            from: current.status,
            to: next,
        });
    }

    let now = Utc::now().naive_utc();
    let now = now.with_nanosecond(0).unwrap_or(now);
    tx.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![next.as_str(), now.format(TIMESTAMP_FORMAT).to_string(), id],
    )?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        from = current.status.as_str(),
        to = next.as_str(),
        "booking status updated"
    );

    Ok(BookingRecord {
        status: next,
        updated_at: now,
        ..current
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingStats {
    pub total: i64,
    pub today: i64,
    pub confirmed: i64,
    pub pending: i64,
    pub cancelled: i64,
    pub customers: i64,
}

pub fn get_booking_stats(conn: &Connection) -> Result<BookingStats, AppError> {
    let today = Local::now().date_naive().format(DATE_FORMAT).to_string();
    let count = |sql: &str, p: &[&dyn ToSql]| -> rusqlite::Result<i64> {
        conn.query_row(sql, p, |row| row.get(0))
    };

    Ok(BookingStats {
        total: count("SELECT COUNT(*) FROM bookings", &[])?,
        today: count("SELECT COUNT(*) FROM bookings WHERE date = ?1", &[&today])?,
        confirmed: count("SELECT COUNT(*) FROM bookings WHERE status = 'confirmed'", &[])?,
        pending: count("SELECT COUNT(*) FROM bookings WHERE status = 'pending'", &[])?,
        cancelled: count("SELECT COUNT(*) FROM bookings WHERE status = 'cancelled'", &[])?,
        customers: count("SELECT COUNT(*) FROM customers", &[])?,
    })
}

// ── Row parsing ──

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<BookingRecord> {
    let date: String = row.get(3)?;
    let time: String = row.get(4)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(BookingRecord {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        service: row.get(2)?,
        date: parse_column(3, &date, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
        time: parse_column(4, &time, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        party_size: row.get(5)?,
        status: parse_status(6, &status)?,
        created_at: parse_column(7, &created_at, |s| {
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        })?,
        updated_at: parse_column(8, &updated_at, |s| {
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        })?,
    })
}

fn parse_customer_row(row: &rusqlite::Row) -> rusqlite::Result<CustomerRecord> {
    let created_at: String = row.get(4)?;
    Ok(CustomerRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        created_at: parse_column(4, &created_at, |s| {
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        })?,
    })
}

fn parse_view_row(row: &rusqlite::Row) -> rusqlite::Result<BookingView> {
    let status: String = row.get(9)?;
    Ok(BookingView {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        customer_email: row.get(3)?,
        customer_phone: row.get(4)?,
        service: row.get(5)?,
        date: row.get(6)?,
        time: row.get(7)?,
        party_size: row.get(8)?,
        status: parse_status(9, &status)?,
        created_at: row.get(10)?,
    })
}

fn parse_column<T>(
    idx: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> chrono::ParseResult<T>,
) -> rusqlite::Result<T> {
    parse(raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_status(idx: usize, raw: &str) -> rusqlite::Result<BookingStatus> {
    BookingStatus::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown booking status: {raw}").into(),
        )
    })
}

fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn now_string() -> String {
    Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

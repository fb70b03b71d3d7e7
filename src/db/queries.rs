use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, ConversationState, Session, SlotContext};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ── Sessions ──

/// Returns `Ok(None)` for absent, expired and unreadable rows alike.
pub fn get_session(conn: &Connection, id: &str) -> anyhow::Result<Option<Session>> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let mut stmt = conn.prepare(
        "SELECT id, state, context, retries, last_activity, expires_at FROM sessions WHERE id = ?1 AND expires_at > ?2",
    )?;

    let result = stmt.query_row(params![id, now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    });

    let (id, state_str, context_json, retries, last_activity_str, expires_at_str) = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let Some(state) = ConversationState::parse(&state_str) else {
        tracing::warn!(session = %id, state = %state_str, "stored session has unknown state, starting fresh");
        return Ok(None);
    };

    let context: SlotContext = match serde_json::from_str(&context_json) {
        Ok(context) => context,
        Err(e) => {
            tracing::warn!(session = %id, error = %e, "stored session context is corrupt, starting fresh");
            return Ok(None);
        }
    };

    let now = Utc::now().naive_utc();
    Ok(Some(Session {
        id,
        state,
        context,
        retries: u32::try_from(retries).unwrap_or(0),
        last_activity: NaiveDateTime::parse_from_str(&last_activity_str, TIMESTAMP_FORMAT)
            .unwrap_or(now),
        expires_at: NaiveDateTime::parse_from_str(&expires_at_str, TIMESTAMP_FORMAT)
            .unwrap_or(now),
    }))
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let context_json = serde_json::to_string(&session.context)?;
    let last_activity = session.last_activity.format(TIMESTAMP_FORMAT).to_string();
    let expires_at = session.expires_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO sessions (id, state, context, retries, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
           state = excluded.state,
           context = excluded.context,
           retries = excluded.retries,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            session.id,
            session.state.as_str(),
            context_json,
            session.retries,
            last_activity,
            expires_at,
        ],
    )?;
    Ok(())
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

pub fn count_active_sessions(conn: &Connection) -> anyhow::Result<i64> {
    let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sessions WHERE expires_at > ?1",
        params![now],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (id, caller_id, customer_name, service, date, time, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            booking.id,
            booking.caller_id,
            booking.customer_name,
            booking.service,
            booking.date,
            booking.time,
            created_at,
        ],
    )?;
    Ok(())
}

pub fn get_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, caller_id, customer_name, service, date, time, created_at
         FROM bookings ORDER BY date ASC, time ASC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        let created_at: String = row.get(6)?;
        Ok(Booking {
            id: row.get(0)?,
            caller_id: row.get(1)?,
            customer_name: row.get(2)?,
            service: row.get(3)?,
            date: row.get(4)?,
            time: row.get(5)?,
            created_at: NaiveDateTime::parse_from_str(&created_at, TIMESTAMP_FORMAT)
                .unwrap_or_else(|_| Utc::now().naive_utc()),
        })
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

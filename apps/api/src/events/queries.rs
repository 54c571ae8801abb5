use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::event::EventRow;

const EVENT_COLUMNS: &str =
    "id, title, description, start_time, end_time, location, color, user_id, created_at, updated_at";

/// Inclusive UTC bounds of a calendar month: the first day at 00:00:00
/// through the last day at 23:59:59. `None` for an invalid month or year.
pub fn month_range(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;

    let start = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0)?);
    let end = Utc.from_utc_datetime(&last.and_hms_opt(23, 59, 59)?);
    Some((start, end))
}

/// The user's events ordered by start, optionally limited to `[from, to]`.
pub async fn list_events(
    pool: &PgPool,
    user_id: Uuid,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<EventRow>, sqlx::Error> {
    let (from, to) = match range {
        Some((from, to)) => (Some(from), Some(to)),
        None => (None, None),
    };

    sqlx::query_as::<_, EventRow>(&format!(
        r#"
        SELECT {EVENT_COLUMNS}
        FROM events
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR start_time >= $2)
          AND ($3::timestamptz IS NULL OR start_time <= $3)
        ORDER BY start_time ASC
        "#
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Every column a user can set on an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub color: String,
}

impl From<&EventRow> for EventFields {
    fn from(row: &EventRow) -> Self {
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            start_time: row.start_time,
            end_time: row.end_time,
            location: row.location.clone(),
            color: row.color.clone(),
        }
    }
}

pub async fn insert_event(
    pool: &PgPool,
    user_id: Uuid,
    fields: &EventFields,
) -> Result<EventRow, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(&format!(
        r#"
        INSERT INTO events (id, title, description, start_time, end_time, location, color, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(&fields.location)
    .bind(&fields.color)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn find_event(pool: &PgPool, id: Uuid) -> Result<Option<EventRow>, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_event(
    pool: &PgPool,
    id: Uuid,
    fields: &EventFields,
) -> Result<EventRow, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(&format!(
        r#"
        UPDATE events
        SET title = $2, description = $3, start_time = $4, end_time = $5,
            location = $6, color = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(&fields.location)
    .bind(&fields.color)
    .fetch_one(pool)
    .await
}

pub async fn delete_event(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_range_regular_month() {
        let (start, end) = month_range(2025, 4).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-04-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-04-30T23:59:59+00:00");
    }

    #[test]
    fn test_month_range_december_and_leap_february() {
        let (_, end) = month_range(2024, 12).unwrap();
        assert_eq!(end.to_rfc3339(), "2024-12-31T23:59:59+00:00");

        let (_, end) = month_range(2024, 2).unwrap();
        assert_eq!(end.to_rfc3339(), "2024-02-29T23:59:59+00:00");
        let (_, end) = month_range(2025, 2).unwrap();
        assert_eq!(end.to_rfc3339(), "2025-02-28T23:59:59+00:00");
    }

    #[test]
    fn test_month_range_rejects_invalid_month() {
        assert!(month_range(2025, 0).is_none());
        assert!(month_range(2025, 13).is_none());
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, DATE_FORMAT},
};
use crate::models::{Session, SessionRecord};

fn row_to_record(row: &Row) -> Result<SessionRecord> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        session: Session {
            app_name: row.get("app_name")?,
            window_title: row.get("window_title")?,
            start_time: parse_datetime(&start_time, "start_time")?,
            end_time: parse_datetime(&end_time, "end_time")?,
            duration_seconds: row.get("duration_seconds")?,
        },
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

impl Database {
    /// Persists a drained batch in one transaction: each session is
    /// upserted on its (app, title, start) identity, and the daily total
    /// for its local start date grows by the duration the store has not
    /// yet seen for that identity. Re-flushing a still-open segment is
    /// therefore convergent instead of double-counting, and a crash
    /// mid-flush leaves either the whole batch or none of it.
    pub async fn flush_batch(&self, sessions: Vec<Session>) -> Result<()> {
        if sessions.is_empty() {
            return Ok(());
        }

        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open flush transaction")?;

            {
                let mut select_previous = tx.prepare(
                    "SELECT duration_seconds FROM sessions
                     WHERE app_name = ?1 AND window_title = ?2 AND start_time = ?3",
                )?;
                let mut upsert_session = tx.prepare(
                    "INSERT INTO sessions
                         (app_name, window_title, start_time, end_time, duration_seconds, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (app_name, window_title, start_time) DO UPDATE SET
                         end_time = excluded.end_time,
                         duration_seconds = excluded.duration_seconds",
                )?;
                let mut upsert_total = tx.prepare(
                    "INSERT INTO daily_totals (app_name, date, total_seconds)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT (app_name, date) DO UPDATE SET
                         total_seconds = total_seconds + excluded.total_seconds",
                )?;

                let created_at = Utc::now().to_rfc3339();
                for session in &sessions {
                    let start_time = session.start_time.to_rfc3339();
                    let previous: i64 = select_previous
                        .query_row(
                            params![session.app_name, session.window_title, start_time],
                            |row| row.get(0),
                        )
                        .optional()?
                        .unwrap_or(0);

                    upsert_session.execute(params![
                        session.app_name,
                        session.window_title,
                        start_time,
                        session.end_time.to_rfc3339(),
                        session.duration_seconds,
                        created_at,
                    ])?;

                    let delta = (session.duration_seconds - previous).max(0);
                    if delta > 0 {
                        upsert_total.execute(params![
                            session.app_name,
                            session.local_date().format(DATE_FORMAT).to_string(),
                            delta,
                        ])?;
                    }
                }
            }

            tx.commit().context("failed to commit flush transaction")
        })
        .await
    }

    /// Sessions whose start timestamp falls inside the inclusive range,
    /// oldest first.
    pub async fn query_sessions(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>> {
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, app_name, window_title, start_time, end_time, duration_seconds, created_at
                 FROM sessions
                 WHERE start_time >= ?1 AND start_time <= ?2
                 ORDER BY start_time ASC",
            )?;

            let mut rows = stmt.query(params![start.to_rfc3339(), end.to_rfc3339()])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(row_to_record(row)?);
            }

            Ok(records)
        })
        .await
    }
}

use quiz_core::model::{QuizSummary, SessionId};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{QuizSummaryRepository, QuizSummaryRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn map_summary_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizSummary, StorageError> {
    let session_id: SessionId = row
        .try_get::<String, _>("session_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    QuizSummary::new(session_id, score, total, started_at, completed_at).map_err(ser)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl QuizSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &QuizSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_summaries (
                    session_id, score, total, started_at, completed_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(summary.session_id().to_string())
        .bind(i64::from(summary.score()))
        .bind(i64::from(summary.total()))
        .bind(summary.started_at())
        .bind(summary.completed_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict(summary.session_id())
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn get_summary(&self, id: i64) -> Result<QuizSummary, StorageError> {
        let row = sqlx::query(
            r"
                SELECT session_id, score, total, started_at, completed_at
                FROM quiz_summaries
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_summary_row(&row)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<QuizSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, session_id, score, total, started_at, completed_at
                FROM quiz_summaries
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id").map_err(ser)?;
                Ok(QuizSummaryRow::new(id, map_summary_row(row)?))
            })
            .collect()
    }
}

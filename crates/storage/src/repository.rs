use async_trait::async_trait;
use quiz_core::model::{QuizSummary, SessionId};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("summary for session {0} already stored")]
    Conflict(SessionId),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted summary together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummaryRow {
    pub id: i64,
    pub summary: QuizSummary,
}

impl QuizSummaryRow {
    #[must_use]
    pub fn new(id: i64, summary: QuizSummary) -> Self {
        Self { id, summary }
    }
}

/// Repository contract for completed quiz results.
#[async_trait]
pub trait QuizSummaryRepository: Send + Sync {
    /// Append a summary and return its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a summary for the same session was
    /// already stored, or other storage errors.
    async fn append_summary(&self, summary: &QuizSummary) -> Result<i64, StorageError>;

    /// Fetch a summary by storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_summary(&self, id: i64) -> Result<QuizSummary, StorageError>;

    /// Most recently completed summaries first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the rows cannot be read.
    async fn list_recent(&self, limit: u32) -> Result<Vec<QuizSummaryRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    summaries: Arc<Mutex<Vec<QuizSummaryRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &QuizSummary) -> Result<i64, StorageError> {
        let mut guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|row| row.summary.session_id() == summary.session_id())
        {
            return Err(StorageError::Conflict(summary.session_id()));
        }
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("summary id overflow".into()))?
            + 1;
        guard.push(QuizSummaryRow::new(id, summary.clone()));
        Ok(id)
    }

    async fn get_summary(&self, id: i64) -> Result<QuizSummary, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.summary.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<QuizSummaryRow>, StorageError> {
        let guard = self
            .summaries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows = guard.clone();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Holds the result repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub summaries: Arc<dyn QuizSummaryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            summaries: Arc::new(InMemoryRepository::new()),
        }
    }
}

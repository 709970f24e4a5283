use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::SessionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds question count ({total})")]
    ScoreExceedsTotal { score: u32, total: u32 },

    #[error("a quiz summary needs at least one question")]
    NoQuestions,
}

/// Final result of a completed quiz session.
///
/// This is what the completion sink receives and what the result store persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    session_id: SessionId,
    score: u32,
    total: u32,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl QuizSummary {
    /// Build a summary, checking that the numbers and timestamps agree.
    ///
    /// # Errors
    ///
    /// Returns `QuizSummaryError` when `total` is zero, `score > total`, or
    /// `completed_at` precedes `started_at`.
    pub fn new(
        session_id: SessionId,
        score: u32,
        total: u32,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, QuizSummaryError> {
        if total == 0 {
            return Err(QuizSummaryError::NoQuestions);
        }
        if score > total {
            return Err(QuizSummaryError::ScoreExceedsTotal { score, total });
        }
        if completed_at < started_at {
            return Err(QuizSummaryError::InvalidTimeRange);
        }

        Ok(Self {
            session_id,
            score,
            total,
            started_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.completed_at - self.started_at
    }

    /// Share of correct answers as a whole percentage, rounded down.
    #[must_use]
    pub fn percent(&self) -> u32 {
        let percent = u64::from(self.score) * 100 / u64::from(self.total);
        u32::try_from(percent).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn summary_reports_percent_and_duration() {
        let start = fixed_now();
        let end = start + Duration::seconds(90);
        let summary = QuizSummary::new(SessionId::generate(), 2, 3, start, end).unwrap();

        assert_eq!(summary.percent(), 66);
        assert_eq!(summary.duration(), Duration::seconds(90));
    }

    #[test]
    fn rejects_inconsistent_numbers() {
        let now = fixed_now();
        assert_eq!(
            QuizSummary::new(SessionId::generate(), 4, 3, now, now).unwrap_err(),
            QuizSummaryError::ScoreExceedsTotal { score: 4, total: 3 }
        );
        assert_eq!(
            QuizSummary::new(SessionId::generate(), 0, 0, now, now).unwrap_err(),
            QuizSummaryError::NoQuestions
        );
        assert_eq!(
            QuizSummary::new(
                SessionId::generate(),
                0,
                1,
                now,
                now - Duration::seconds(1)
            )
            .unwrap_err(),
            QuizSummaryError::InvalidTimeRange
        );
    }
}

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

use quiz_core::model::{AnswerRecord, ChoiceId, Question, QuizSummary, SessionId};

use super::evaluator::{Evaluation, evaluate};
use crate::error::SessionError;

//
// ─── PHASE & OUTCOMES ──────────────────────────────────────────────────────────
//

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InProgress { index: usize },
    Completed { score: u32, total: u32 },
}

/// What a successful confirm did after committing the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved { index: usize },
    Completed(QuizSummary),
}

/// Outcome of `QuizSession::confirm_and_advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub evaluation: Evaluation,
    pub score: u32,
    /// New score minus the score before this confirm. Negative when a revisited
    /// question is re-answered wrongly.
    pub score_delta: i64,
    pub step: Step,
}

/// Snapshot of session progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub score: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through an ordered list of questions.
///
/// Holds the active index, the tentative selection, the committed answers and
/// the score. The score is always re-derived from the committed answers, so it
/// can never drift from them when a question is revisited.
pub struct QuizSession {
    id: SessionId,
    questions: Vec<Question>,
    total: u32,
    current: usize,
    tentative: Option<ChoiceId>,
    answers: AnswerRecord,
    score: u32,
    started_at: DateTime<Utc>,
    summary: Option<QuizSummary>,
}

impl QuizSession {
    /// Create a session over `questions`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided and
    /// `SessionError::TooManyQuestions` if the count does not fit a `u32`.
    pub fn new(questions: Vec<Question>, started_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let total = u32::try_from(questions.len())
            .map_err(|_| SessionError::TooManyQuestions(questions.len()))?;

        Ok(Self {
            id: SessionId::generate(),
            questions,
            total,
            current: 0,
            tentative: None,
            answers: AnswerRecord::new(),
            score: 0,
            started_at,
            summary: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The question being answered, or `None` once the session is complete.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn tentative(&self) -> Option<&ChoiceId> {
        self.tentative.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerRecord {
        &self.answers
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    /// Final result, present once the last question has been confirmed.
    #[must_use]
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match &self.summary {
            Some(summary) => SessionPhase::Completed {
                score: summary.score(),
                total: summary.total(),
            },
            None => SessionPhase::InProgress {
                index: self.current,
            },
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            index: self.current,
            total: self.questions.len(),
            answered: self.answers.len(),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    /// Pick `choice` for the current question without committing it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion and
    /// `SessionError::UnknownChoice` if the current question has no such choice.
    pub fn select_answer(&mut self, choice: &ChoiceId) -> Result<(), SessionError> {
        let question = self.current_question().ok_or(SessionError::Completed)?;
        if question.choice(choice).is_none() {
            debug!(session = %self.id, %choice, "rejected unknown choice");
            return Err(SessionError::UnknownChoice(choice.clone()));
        }
        self.tentative = Some(choice.clone());
        Ok(())
    }

    /// Commit the tentative selection, re-score, and move on.
    ///
    /// On the last question the session completes and the returned `Advance`
    /// carries the summary to report. Nothing changes when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion,
    /// `SessionError::NoSelection` without a tentative selection, and
    /// `SessionError::Summary` if the completion summary cannot be built.
    pub fn confirm_and_advance(&mut self, now: DateTime<Utc>) -> Result<Advance, SessionError> {
        let question = self.current_question().ok_or(SessionError::Completed)?;
        let Some(choice) = self.tentative.as_ref() else {
            debug!(session = %self.id, index = self.current, "confirm without selection");
            return Err(SessionError::NoSelection);
        };
        let evaluation = evaluate(question, choice)
            .ok_or_else(|| SessionError::UnknownChoice(choice.clone()))?;

        let mut answers = self.answers.clone();
        answers.record(self.current, evaluation.choice_id.clone());
        let score = answers.count_correct(&self.questions);
        let score_delta = i64::from(score) - i64::from(self.score);

        let is_last = self.current + 1 >= self.questions.len();
        let step = if is_last {
            let completed_at = now.max(self.started_at);
            let summary =
                QuizSummary::new(self.id, score, self.total, self.started_at, completed_at)?;
            Step::Completed(summary)
        } else {
            Step::Moved {
                index: self.current + 1,
            }
        };

        self.answers = answers;
        self.score = score;
        match &step {
            Step::Moved { index } => {
                self.current = *index;
                self.tentative = self.answers.get(*index).cloned();
            }
            Step::Completed(summary) => {
                self.tentative = None;
                self.summary = Some(summary.clone());
            }
        }

        Ok(Advance {
            evaluation,
            score,
            score_delta,
            step,
        })
    }

    /// Step back one question, restoring its recorded answer as the selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstQuestion` at index 0 and
    /// `SessionError::Completed` after completion.
    pub fn go_to_previous(&mut self) -> Result<usize, SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        if self.current == 0 {
            return Err(SessionError::AtFirstQuestion);
        }
        self.current -= 1;
        self.tentative = self.answers.get(self.current).cloned();
        Ok(self.current)
    }

    /// Start over with the same questions under a fresh session id.
    pub fn restart(&mut self, started_at: DateTime<Utc>) {
        self.id = SessionId::generate();
        self.current = 0;
        self.tentative = None;
        self.answers = AnswerRecord::new();
        self.score = 0;
        self.started_at = started_at;
        self.summary = None;
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("tentative", &self.tentative)
            .field("answers_len", &self.answers.len())
            .field("score", &self.score)
            .field("started_at", &self.started_at)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

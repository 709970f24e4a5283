//! Shared error types for the services crate.

use reqwest::StatusCode;
use thiserror::Error;

use quiz_core::model::{ChoiceId, QuestionError, QuizSummaryError};

/// Rejections from the quiz session state machine.
///
/// Every variant leaves the session untouched; callers may surface or ignore them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("choice {0} does not belong to the current question")]
    UnknownChoice(ChoiceId),
    #[error("no answer selected")]
    NoSelection,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("session already completed")]
    Completed,
    #[error("too many questions for one session: {0}")]
    TooManyQuestions(usize),
    #[error(transparent)]
    Summary(#[from] QuizSummaryError),
}

/// Reasons a hint request is not sent. Nothing changes when one is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HintRejected {
    #[error("hints are not configured")]
    Disabled,
    #[error("hint prompt is empty")]
    EmptyPrompt,
    #[error("a hint request is already in flight")]
    InFlight,
    #[error("session already completed")]
    Completed,
}

/// Errors emitted while talking to the assistant endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HintError {
    #[error("sign in to ask for hints")]
    Unauthenticated,
    #[error("{message}")]
    HttpStatus { status: StatusCode, message: String },
    #[error("could not reach the assistant: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant reply was interrupted: {0}")]
    Stream(String),
}

impl HintError {
    /// Builds a human-readable error for a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        let message = match status {
            StatusCode::UNAUTHORIZED => format!("authorization failed ({code}); sign in again"),
            StatusCode::FORBIDDEN => format!("not allowed to use the assistant ({code})"),
            StatusCode::TOO_MANY_REQUESTS => {
                format!("too many hint requests ({code}); try again shortly")
            }
            s if s.is_server_error() => format!("assistant unavailable ({code})"),
            _ => format!("assistant request failed with status {code}"),
        };
        Self::HttpStatus { status, message }
    }
}

/// Errors emitted while validating hint configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HintConfigError {
    #[error("invalid assistant endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("assistant endpoint must use http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Errors emitted while loading a question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizLoadError {
    #[error("question file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question #{index} is invalid: {source}")]
    Question {
        index: usize,
        #[source]
        source: QuestionError,
    },
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),
    #[error("question set is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_are_human_readable() {
        assert_eq!(
            HintError::from_status(StatusCode::UNAUTHORIZED).to_string(),
            "authorization failed (401); sign in again"
        );
        assert_eq!(
            HintError::from_status(StatusCode::BAD_GATEWAY).to_string(),
            "assistant unavailable (502)"
        );
        assert_eq!(
            HintError::from_status(StatusCode::NOT_FOUND).to_string(),
            "assistant request failed with status 404"
        );
    }
}

#![forbid(unsafe_code)]

pub mod error;
pub mod hint;
pub mod quiz;
pub mod summaries;

pub use quiz_core::Clock;

pub use error::{HintConfigError, HintError, HintRejected, QuizLoadError, SessionError};
pub use hint::{HintChannel, HintConfig, HintEvent, HintEventKind, HintTicket};
pub use quiz::{
    Advance, ChannelSink, CompletionSink, HintApplied, QuestionView, QuizController, QuizSession,
    SessionPhase, Step, load_questions_json,
};
pub use summaries::{RecorderReport, SummaryRecorder};

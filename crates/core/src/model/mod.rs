mod answer;
mod ids;
mod language;
mod question;
mod summary;

pub use answer::AnswerRecord;
pub use ids::{ChoiceId, QuestionId, SessionId};
pub use language::{LanguageCode, LanguageCodeError};
pub use question::{Choice, ChoiceDraft, Question, QuestionDraft, QuestionError};
pub use summary::{QuizSummary, QuizSummaryError};

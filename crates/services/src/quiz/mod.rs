mod completion;
mod controller;
mod evaluator;
mod loader;
mod session;
mod view;

// Public API of the quiz subsystem.
pub use crate::error::SessionError;
pub use completion::{ChannelSink, CompletionSink, DiscardSink};
pub use controller::{HintApplied, QuizController};
pub use evaluator::{Evaluation, evaluate};
pub use loader::{load_questions_json, shuffle_choices, validate_drafts};
pub use session::{Advance, QuizProgress, QuizSession, SessionPhase, Step};
pub use view::{ChoiceView, Feedback, QuestionView};

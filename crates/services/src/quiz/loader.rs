use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use quiz_core::model::{Question, QuestionDraft};

use crate::error::QuizLoadError;

/// Parse a JSON array of question drafts and validate each one.
///
/// # Errors
///
/// Returns `QuizLoadError::Json` for malformed input, `QuizLoadError::Question`
/// with the offending position for an invalid question,
/// `QuizLoadError::DuplicateQuestion` for repeated ids, and
/// `QuizLoadError::Empty` when the array has no entries.
pub fn load_questions_json(json: &str) -> Result<Vec<Question>, QuizLoadError> {
    let drafts: Vec<QuestionDraft> = serde_json::from_str(json)?;
    validate_drafts(drafts)
}

/// Validate drafts supplied by any question source.
///
/// # Errors
///
/// Same as [`load_questions_json`] minus the JSON case.
pub fn validate_drafts(drafts: Vec<QuestionDraft>) -> Result<Vec<Question>, QuizLoadError> {
    if drafts.is_empty() {
        return Err(QuizLoadError::Empty);
    }

    let mut seen = HashSet::with_capacity(drafts.len());
    let mut questions = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.into_iter().enumerate() {
        let question = draft
            .validate()
            .map_err(|source| QuizLoadError::Question { index, source })?;
        if !seen.insert(question.id().clone()) {
            return Err(QuizLoadError::DuplicateQuestion(question.id().to_string()));
        }
        questions.push(question);
    }
    Ok(questions)
}

/// Shuffle the presentation order of every question's choices.
pub fn shuffle_choices<R: Rng + ?Sized>(questions: &mut [Question], rng: &mut R) {
    for question in questions {
        question.reorder_choices(|choices| choices.shuffle(&mut *rng));
    }
}

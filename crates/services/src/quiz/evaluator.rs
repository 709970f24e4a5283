use quiz_core::model::{ChoiceId, Question};

/// Correctness of one committed selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub choice_id: ChoiceId,
    pub correct: bool,
}

/// Looks up `choice` in `question` and reports whether it is marked correct.
///
/// Returns `None` when the choice does not belong to the question.
#[must_use]
pub fn evaluate(question: &Question, choice: &ChoiceId) -> Option<Evaluation> {
    question.choice(choice).map(|found| Evaluation {
        choice_id: found.id().clone(),
        correct: found.is_correct(),
    })
}

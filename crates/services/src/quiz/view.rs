use quiz_core::model::{ChoiceId, LanguageCode, QuestionId};

use super::session::QuizSession;

/// Feedback coloring for a choice once something is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub id: ChoiceId,
    pub term: String,
    pub selected: bool,
    pub feedback: Option<Feedback>,
}

/// Render-ready state of the active question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub choices: Vec<ChoiceView>,
    pub can_go_back: bool,
    pub can_confirm: bool,
    pub is_last: bool,
}

impl QuizSession {
    /// Builds the view of the current question, or `None` once complete.
    ///
    /// With a selection present, the correct choice is marked `Correct` and a
    /// wrong selected choice `Incorrect`; other choices carry no feedback.
    #[must_use]
    pub fn view(&self, language: Option<&LanguageCode>) -> Option<QuestionView> {
        let question = self.current_question()?;
        let selected = self.tentative();

        let choices = question
            .choices()
            .iter()
            .map(|choice| {
                let is_selected = selected == Some(choice.id());
                let feedback = selected.and_then(|_| {
                    if choice.is_correct() {
                        Some(Feedback::Correct)
                    } else if is_selected {
                        Some(Feedback::Incorrect)
                    } else {
                        None
                    }
                });
                ChoiceView {
                    id: choice.id().clone(),
                    term: choice.term().to_owned(),
                    selected: is_selected,
                    feedback,
                }
            })
            .collect();

        let index = self.current_index();
        let total = self.questions().len();
        Some(QuestionView {
            question_id: question.id().clone(),
            index,
            total,
            prompt: question.prompt_in(language).to_owned(),
            choices,
            can_go_back: index > 0,
            can_confirm: selected.is_some(),
            is_last: index + 1 == total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ChoiceDraft, QuestionDraft};
    use quiz_core::time::fixed_now;

    fn build_session() -> QuizSession {
        let questions = vec![
            QuestionDraft::new(
                "q1",
                "Dog?",
                vec![
                    ChoiceDraft::new("a", "perro", true),
                    ChoiceDraft::new("b", "gato", false),
                ],
            )
            .with_translation("es", "¿Perro?")
            .validate()
            .unwrap(),
            QuestionDraft::new("q2", "Cat?", vec![ChoiceDraft::new("a", "gato", true)])
                .validate()
                .unwrap(),
        ];
        QuizSession::new(questions, fixed_now()).unwrap()
    }

    #[test]
    fn no_feedback_before_selection() {
        let session = build_session();
        let view = session.view(None).unwrap();
        assert_eq!(view.prompt, "Dog?");
        assert!(!view.can_confirm);
        assert!(!view.can_go_back);
        assert!(view.choices.iter().all(|c| c.feedback.is_none() && !c.selected));
    }

    #[test]
    fn wrong_selection_marks_both_choices() {
        let mut session = build_session();
        session.select_answer(&ChoiceId::new("b")).unwrap();
        let view = session.view(None).unwrap();

        assert!(view.can_confirm);
        assert_eq!(view.choices[0].feedback, Some(Feedback::Correct));
        assert_eq!(view.choices[1].feedback, Some(Feedback::Incorrect));
        assert!(view.choices[1].selected);
    }

    #[test]
    fn view_uses_translation_when_available() {
        let session = build_session();
        let es = LanguageCode::new("es").unwrap();
        let fr = LanguageCode::new("fr").unwrap();
        assert_eq!(session.view(Some(&es)).unwrap().prompt, "¿Perro?");
        assert_eq!(session.view(Some(&fr)).unwrap().prompt, "Dog?");
    }

    #[test]
    fn completed_session_has_no_view() {
        let mut session = build_session();
        for _ in 0..2 {
            session.select_answer(&ChoiceId::new("a")).unwrap();
            session.confirm_and_advance(fixed_now()).unwrap();
        }
        assert!(session.view(None).is_none());
    }
}

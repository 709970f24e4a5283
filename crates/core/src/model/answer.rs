use std::collections::BTreeMap;

use crate::model::{ChoiceId, Question};

/// Committed answers of a session, keyed by question index.
///
/// Entries are only ever inserted or overwritten; the last confirmed
/// selection for an index wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerRecord {
    entries: BTreeMap<usize, ChoiceId>,
}

impl AnswerRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `choice` for `index`, returning the previous selection if any.
    pub fn record(&mut self, index: usize, choice: ChoiceId) -> Option<ChoiceId> {
        self.entries.insert(index, choice)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChoiceId> {
        self.entries.get(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ChoiceId)> {
        self.entries.iter().map(|(index, choice)| (*index, choice))
    }

    /// Number of entries whose choice is marked correct in `questions`.
    ///
    /// Entries pointing outside `questions`, or at unknown choices, count as wrong.
    #[must_use]
    pub fn count_correct(&self, questions: &[Question]) -> u32 {
        let correct = self
            .entries
            .iter()
            .filter(|(index, choice)| {
                questions
                    .get(**index)
                    .and_then(|question| question.choice(choice))
                    .is_some_and(|choice| choice.is_correct())
            })
            .count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }
}

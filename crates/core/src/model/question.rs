use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use crate::model::{
    ids::{ChoiceId, QuestionId},
    language::{LanguageCode, LanguageCodeError},
};

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated choice as it arrives from a question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDraft {
    pub id: String,
    pub term: String,
    #[serde(default, alias = "is_correct")]
    pub correct: bool,
}

impl ChoiceDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, term: impl Into<String>, correct: bool) -> Self {
        Self {
            id: id.into(),
            term: term.into(),
            correct,
        }
    }
}

/// Unvalidated question as it arrives from a question source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
    pub choices: Vec<ChoiceDraft>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, choices: Vec<ChoiceDraft>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            translations: BTreeMap::new(),
            choices,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.translations.insert(language.into(), text.into());
        self
    }

    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the id or prompt is blank, when there are no
    /// choices, when a choice id repeats, when a choice term is blank, when no
    /// choice is marked correct, or when a translation key is not a language code.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.choices.is_empty() {
            return Err(QuestionError::NoChoices);
        }

        let mut seen = HashSet::with_capacity(self.choices.len());
        let mut choices = Vec::with_capacity(self.choices.len());
        for draft in self.choices {
            let choice_id = draft.id.trim().to_owned();
            if choice_id.is_empty() {
                return Err(QuestionError::EmptyChoiceId);
            }
            if !seen.insert(choice_id.clone()) {
                return Err(QuestionError::DuplicateChoice(choice_id));
            }
            let term = draft.term.trim();
            if term.is_empty() {
                return Err(QuestionError::EmptyTerm(choice_id));
            }
            choices.push(Choice {
                id: ChoiceId::new(choice_id),
                term: term.to_owned(),
                is_correct: draft.correct,
            });
        }
        if !choices.iter().any(Choice::is_correct) {
            return Err(QuestionError::NoCorrectChoice);
        }

        let mut translations = BTreeMap::new();
        for (language, text) in self.translations {
            let code = LanguageCode::new(&language).map_err(|source| {
                QuestionError::InvalidTranslation { language, source }
            })?;
            let text = text.trim();
            if !text.is_empty() {
                translations.insert(code, text.to_owned());
            }
        }

        Ok(Question {
            id: QuestionId::new(id),
            prompt: prompt.to_owned(),
            translations,
            choices,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question id is empty")]
    EmptyId,

    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question has no choices")]
    NoChoices,

    #[error("choice id is empty")]
    EmptyChoiceId,

    #[error("duplicate choice id: {0}")]
    DuplicateChoice(String),

    #[error("choice {0} has an empty term")]
    EmptyTerm(String),

    #[error("question has no correct choice")]
    NoCorrectChoice,

    #[error("invalid translation language {language:?}: {source}")]
    InvalidTranslation {
        language: String,
        #[source]
        source: LanguageCodeError,
    },
}

//
// ─── VALIDATED TYPES ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    id: ChoiceId,
    term: String,
    is_correct: bool,
}

impl Choice {
    #[must_use]
    pub fn id(&self) -> &ChoiceId {
        &self.id
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}

/// A validated quiz question. Choice order is the presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    translations: BTreeMap<LanguageCode, String>,
    choices: Vec<Choice>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    /// The prompt in the language it was authored in.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    #[must_use]
    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id() == id)
    }

    #[must_use]
    pub fn translations(&self) -> &BTreeMap<LanguageCode, String> {
        &self.translations
    }

    /// Translated prompt for `language`, if the source supplied one.
    #[must_use]
    pub fn translated_prompt(&self, language: &LanguageCode) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }

    /// Prompt to display for `language`, falling back to the original prompt.
    #[must_use]
    pub fn prompt_in(&self, language: Option<&LanguageCode>) -> &str {
        language
            .and_then(|code| self.translated_prompt(code))
            .unwrap_or(&self.prompt)
    }

    /// Reorders choices for presentation. Ids and correctness are untouched.
    pub fn reorder_choices(&mut self, reorder: impl FnOnce(&mut [Choice])) {
        reorder(&mut self.choices);
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

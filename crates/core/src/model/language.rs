use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LanguageCodeError {
    #[error("language code is empty")]
    Empty,

    #[error("invalid language code: {0}")]
    Invalid(String),
}

/// A language tag such as `en`, `es` or `pt-br`, normalized to lowercase.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalize a language tag.
    ///
    /// # Errors
    ///
    /// Returns `LanguageCodeError::Empty` for blank input and
    /// `LanguageCodeError::Invalid` for anything outside `[a-z0-9-]`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, LanguageCodeError> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase().replace('_', "-");
        if normalized.is_empty() {
            return Err(LanguageCodeError::Empty);
        }
        let valid = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !normalized.starts_with('-')
            && !normalized.ends_with('-');
        if !valid {
            return Err(LanguageCodeError::Invalid(raw.as_ref().to_owned()));
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({})", self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}

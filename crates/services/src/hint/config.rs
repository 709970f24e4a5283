use std::env;
use std::time::Duration;

use url::Url;

use crate::error::HintConfigError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Validated settings for the hint assistant endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintConfig {
    endpoint: Url,
    system_prompt: Option<String>,
    connect_timeout: Duration,
}

/// Raw hint settings, e.g. from the environment or a settings form.
#[derive(Clone, Debug, Default)]
pub struct HintConfigDraft {
    pub endpoint: Option<String>,
    pub system_prompt: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl HintConfigDraft {
    /// Read `QUIZ_ASSISTANT_URL`, `QUIZ_ASSISTANT_SYSTEM_PROMPT` and
    /// `QUIZ_ASSISTANT_CONNECT_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `HintConfigError::InvalidEnv` if the timeout is not a number.
    pub fn from_env() -> Result<Self, HintConfigError> {
        let connect_timeout_secs = match env::var("QUIZ_ASSISTANT_CONNECT_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.trim().parse().map_err(|_| HintConfigError::InvalidEnv {
                var: "QUIZ_ASSISTANT_CONNECT_TIMEOUT_SECS",
                value: raw.clone(),
            })?),
            Err(_) => None,
        };
        Ok(Self {
            endpoint: env::var("QUIZ_ASSISTANT_URL").ok(),
            system_prompt: env::var("QUIZ_ASSISTANT_SYSTEM_PROMPT").ok(),
            connect_timeout_secs,
        })
    }

    /// Validate and normalize the draft.
    ///
    /// Returns `Ok(None)` when no endpoint is set, meaning hints are disabled.
    ///
    /// # Errors
    ///
    /// Returns `HintConfigError` if the endpoint is not an absolute http(s) URL.
    pub fn validate(self) -> Result<Option<HintConfig>, HintConfigError> {
        let Some(raw) = normalize_optional(self.endpoint) else {
            return Ok(None);
        };
        let endpoint = Url::parse(&raw)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(HintConfigError::UnsupportedScheme(
                endpoint.scheme().to_owned(),
            ));
        }

        Ok(Some(HintConfig {
            endpoint,
            system_prompt: normalize_optional(self.system_prompt),
            connect_timeout: self
                .connect_timeout_secs
                .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_secs),
        }))
    }
}

impl HintConfig {
    /// Hint settings from the environment, `None` if `QUIZ_ASSISTANT_URL` is unset.
    ///
    /// # Errors
    ///
    /// Returns `HintConfigError` for malformed values.
    pub fn from_env() -> Result<Option<Self>, HintConfigError> {
        HintConfigDraft::from_env()?.validate()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

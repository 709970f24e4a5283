use std::env;

use async_trait::async_trait;

use crate::error::HintError;

/// Supplies the bearer token for assistant requests.
///
/// Passed explicitly to the HTTP client; nothing reads ambient auth state.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch a token for the next request.
    ///
    /// # Errors
    ///
    /// Returns `HintError::Unauthenticated` when no token is available.
    async fn token(&self) -> Result<String, HintError>;
}

/// A fixed token, e.g. issued at sign-in.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, HintError> {
        non_blank(Some(self.0.clone()))
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Clone, Debug)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub const DEFAULT_VAR: &'static str = "QUIZ_ASSISTANT_TOKEN";

    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> Result<String, HintError> {
        non_blank(env::var(&self.var).ok())
    }
}

fn non_blank(token: Option<String>) -> Result<String, HintError> {
    token
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or(HintError::Unauthenticated)
}

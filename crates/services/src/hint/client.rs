use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::config::HintConfig;
use super::token::TokenProvider;
use crate::error::HintError;

/// Text fragments of an assistant reply, in arrival order.
pub type ReplyStream = BoxStream<'static, Result<String, HintError>>;

/// Body sent to the assistant endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRequest {
    pub contextual_prompt: String,
}

impl HintRequest {
    /// Combines the optional system preamble, the question being answered and
    /// the learner's own text into one prompt.
    #[must_use]
    pub fn compose(system_prompt: Option<&str>, question_prompt: &str, user_prompt: &str) -> Self {
        let mut contextual_prompt = String::new();
        if let Some(system) = system_prompt {
            contextual_prompt.push_str(system);
            contextual_prompt.push_str("\n\n");
        }
        contextual_prompt.push_str("Question: ");
        contextual_prompt.push_str(question_prompt);
        contextual_prompt.push_str("\n\n");
        contextual_prompt.push_str(user_prompt.trim());
        Self { contextual_prompt }
    }
}

/// A remote assistant that answers hint requests with streamed text.
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Send `request` and return the reply as a stream of text fragments.
    ///
    /// # Errors
    ///
    /// Returns `HintError` if authentication, the request or the HTTP status fails.
    /// Failures while reading the body surface as `Err` items in the stream.
    async fn stream_reply(&self, request: HintRequest) -> Result<ReplyStream, HintError>;
}

/// `AssistantClient` over HTTP with bearer auth.
#[derive(Clone)]
pub struct HttpAssistant {
    client: Client,
    endpoint: Url,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpAssistant {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `HintError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &HintConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, HintError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint().clone(),
            tokens,
        })
    }
}

#[async_trait]
impl AssistantClient for HttpAssistant {
    async fn stream_reply(&self, request: HintRequest) -> Result<ReplyStream, HintError> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "assistant rejected hint request");
            return Err(HintError::from_status(status));
        }
        debug!(%status, "assistant reply streaming");

        let body = Box::pin(response.bytes_stream());
        let fragments = stream::unfold(
            (body, Utf8Chunker::default(), false),
            |(mut body, mut chunker, done)| async move {
                if done {
                    return None;
                }
                loop {
                    match body.next().await {
                        Some(Ok(bytes)) => {
                            let text = chunker.push(&bytes);
                            if !text.is_empty() {
                                return Some((Ok(text), (body, chunker, false)));
                            }
                        }
                        Some(Err(err)) => {
                            let err = HintError::Stream(err.to_string());
                            return Some((Err(err), (body, chunker, true)));
                        }
                        None => {
                            let rest = chunker.finish();
                            if rest.is_empty() {
                                return None;
                            }
                            return Some((Ok(rest), (body, chunker, true)));
                        }
                    }
                }
            },
        );
        Ok(fragments.boxed())
    }
}

/// Turns raw body chunks into text, holding back a multi-byte character that
/// straddles two chunks until its remaining bytes arrive.
#[derive(Debug, Default)]
pub(crate) struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            let failure = match std::str::from_utf8(&self.pending) {
                Ok(_) => None,
                Err(err) => Some((err.valid_up_to(), err.error_len())),
            };
            match failure {
                None => {
                    out.push_str(&String::from_utf8_lossy(&self.pending));
                    self.pending.clear();
                    return out;
                }
                Some((valid, Some(bad))) => {
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.pending.drain(..valid + bad);
                }
                Some((valid, None)) => {
                    // incomplete sequence at the end
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    self.pending.drain(..valid);
                    return out;
                }
            }
        }
    }

    pub(crate) fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

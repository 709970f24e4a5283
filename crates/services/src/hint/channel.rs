use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use super::client::{AssistantClient, HintRequest, HttpAssistant};
use super::config::HintConfig;
use super::exchange::HintTicket;
use super::token::TokenProvider;
use crate::error::HintError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintEventKind {
    Chunk(String),
    Finished,
    Failed(String),
}

/// One step of a streamed hint reply, tagged with the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintEvent {
    pub ticket: HintTicket,
    pub kind: HintEventKind,
}

/// Runs hint requests as background tasks and funnels their output into one queue.
///
/// Each request gets a fresh ticket. Cancelling aborts the running task and
/// moves the generation on, so anything it already queued is recognizably stale.
pub struct HintChannel {
    client: Arc<dyn AssistantClient>,
    system_prompt: Option<String>,
    generation: u64,
    in_flight: Option<AbortHandle>,
    tx: mpsc::UnboundedSender<HintEvent>,
    rx: mpsc::UnboundedReceiver<HintEvent>,
}

impl HintChannel {
    #[must_use]
    pub fn new(client: Arc<dyn AssistantClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            system_prompt: None,
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Channel talking HTTP to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `HintError::Http` if the HTTP client cannot be built.
    pub fn from_config(
        config: &HintConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> Result<Self, HintError> {
        let client = HttpAssistant::new(config, tokens)?;
        Ok(Self::new(Arc::new(client))
            .with_system_prompt(config.system_prompt().map(str::to_owned)))
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub(crate) fn issue(&mut self, question_index: usize) -> HintTicket {
        self.generation += 1;
        HintTicket::new(question_index, self.generation)
    }

    /// Spawns the request task. Must be called from within a tokio runtime.
    pub(crate) fn dispatch(&mut self, ticket: HintTicket, question_prompt: &str, user_prompt: &str) {
        self.cancel_task();
        let request = HintRequest::compose(self.system_prompt.as_deref(), question_prompt, user_prompt);
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        info!(
            question = ticket.question_index(),
            generation = ticket.generation(),
            "sending hint request"
        );

        let handle = tokio::spawn(async move {
            let send = |kind| tx.send(HintEvent { ticket, kind }).is_ok();

            let mut stream = match client.stream_reply(request).await {
                Ok(stream) => stream,
                Err(err) => {
                    warn!(error = %err, "hint request failed");
                    send(HintEventKind::Failed(err.to_string()));
                    return;
                }
            };
            while let Some(item) = stream.next().await {
                match item {
                    Ok(text) => {
                        if !send(HintEventKind::Chunk(text)) {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "hint stream failed");
                        send(HintEventKind::Failed(err.to_string()));
                        return;
                    }
                }
            }
            send(HintEventKind::Finished);
        });
        self.in_flight = Some(handle.abort_handle());
    }

    /// Abandon whatever request is running. Its queued output becomes stale.
    pub(crate) fn cancel(&mut self) {
        if self.cancel_task() {
            debug!(generation = self.generation, "cancelled hint request");
        }
        self.generation += 1;
    }

    fn cancel_task(&mut self) -> bool {
        match self.in_flight.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Next event from any request, in arrival order.
    pub async fn recv(&mut self) -> Option<HintEvent> {
        self.rx.recv().await
    }
}

use quiz_core::model::QuizSummary;
use tokio::sync::mpsc;
use tracing::warn;

/// Receives the final result of a session, exactly once per completed run.
///
/// `summary.score()` and `summary.total()` are the headline numbers; storing
/// or displaying them is the sink's business.
pub trait CompletionSink: Send {
    fn on_complete(&mut self, summary: &QuizSummary);
}

impl<F> CompletionSink for F
where
    F: FnMut(&QuizSummary) + Send,
{
    fn on_complete(&mut self, summary: &QuizSummary) {
        self(summary);
    }
}

/// Sink that ignores results.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl CompletionSink for DiscardSink {
    fn on_complete(&mut self, _summary: &QuizSummary) {}
}

/// Hands summaries to an async consumer such as `SummaryRecorder`.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<QuizSummary>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<QuizSummary>) -> Self {
        Self { tx }
    }
}

impl CompletionSink for ChannelSink {
    fn on_complete(&mut self, summary: &QuizSummary) {
        if self.tx.send(summary.clone()).is_err() {
            warn!(session = %summary.session_id(), "summary receiver dropped; result not recorded");
        }
    }
}

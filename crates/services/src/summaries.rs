use std::sync::Arc;

use quiz_core::model::QuizSummary;
use storage::repository::QuizSummaryRepository;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::quiz::ChannelSink;

/// Counts from a finished recorder task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderReport {
    pub stored: usize,
    pub failed: usize,
}

/// Persists completed quiz summaries in the background.
///
/// The controller's completion sink is synchronous; this bridges it to the
/// async repository. The task ends once every `ChannelSink` clone is dropped.
pub struct SummaryRecorder {
    handle: JoinHandle<RecorderReport>,
}

impl SummaryRecorder {
    /// Spawn the recorder and return the sink that feeds it.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(repo: Arc<dyn QuizSummaryRepository>) -> (ChannelSink, Self) {
        let (tx, mut rx) = mpsc::unbounded_channel::<QuizSummary>();
        let handle = tokio::spawn(async move {
            let mut report = RecorderReport::default();
            while let Some(summary) = rx.recv().await {
                match repo.append_summary(&summary).await {
                    Ok(id) => {
                        report.stored += 1;
                        info!(id, session = %summary.session_id(), "quiz summary stored");
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(error = %err, session = %summary.session_id(), "failed to store quiz summary");
                    }
                }
            }
            report
        });
        (ChannelSink::new(tx), Self { handle })
    }

    /// Wait until all queued summaries are handled.
    ///
    /// Drop every sink first, otherwise this waits forever.
    pub async fn finish(self) -> RecorderReport {
        match self.handle.await {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "summary recorder task ended abnormally");
                RecorderReport::default()
            }
        }
    }
}

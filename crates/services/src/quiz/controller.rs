use tracing::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{ChoiceId, LanguageCode, Question, QuizSummary};

use super::completion::CompletionSink;
use super::session::{Advance, QuizSession, Step};
use super::view::QuestionView;
use crate::error::{HintRejected, SessionError};
use crate::hint::{ChatExchange, HintChannel, HintEvent, HintEventKind, HintTicket};

/// Whether a hint event changed the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintApplied {
    Applied,
    Stale,
}

/// Drives one quiz: answers, navigation, hints and completion reporting.
///
/// All methods run on the caller's task. Hint requests run in the background
/// and their output comes back through [`QuizController::next_hint_event`],
/// to be fed into [`QuizController::apply_hint_event`].
pub struct QuizController {
    clock: Clock,
    session: QuizSession,
    sink: Box<dyn CompletionSink>,
    exchange: ChatExchange,
    hints: Option<HintChannel>,
    language: Option<LanguageCode>,
}

impl QuizController {
    /// Start a quiz over `questions`, reporting the result to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn new(
        clock: Clock,
        questions: Vec<Question>,
        sink: impl CompletionSink + 'static,
    ) -> Result<Self, SessionError> {
        let session = QuizSession::new(questions, clock.now())?;
        info!(session = %session.id(), questions = session.total(), "quiz session started");
        Ok(Self {
            clock,
            session,
            sink: Box::new(sink),
            exchange: ChatExchange::default(),
            hints: None,
            language: None,
        })
    }

    #[must_use]
    pub fn with_hints(mut self, hints: HintChannel) -> Self {
        self.hints = Some(hints);
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Option<LanguageCode>) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn exchange(&self) -> &ChatExchange {
        &self.exchange
    }

    #[must_use]
    pub fn hints_enabled(&self) -> bool {
        self.hints.is_some()
    }

    #[must_use]
    pub fn language(&self) -> Option<&LanguageCode> {
        self.language.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> Option<QuestionView> {
        self.session.view(self.language.as_ref())
    }

    #[must_use]
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.session.summary()
    }

    //
    // ─── ANSWERS & NAVIGATION ──────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// See [`QuizSession::select_answer`].
    pub fn select_answer(&mut self, choice: &ChoiceId) -> Result<(), SessionError> {
        self.session.select_answer(choice)
    }

    /// Commit the selection and move on, reporting completion to the sink.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::confirm_and_advance`].
    pub fn confirm_and_advance(&mut self) -> Result<Advance, SessionError> {
        let advance = self.session.confirm_and_advance(self.clock.now())?;
        self.reset_hint();

        if let Step::Completed(summary) = &advance.step {
            info!(
                session = %summary.session_id(),
                score = summary.score(),
                total = summary.total(),
                "quiz session completed"
            );
            self.sink.on_complete(summary);
        }
        Ok(advance)
    }

    /// # Errors
    ///
    /// See [`QuizSession::go_to_previous`].
    pub fn go_to_previous(&mut self) -> Result<usize, SessionError> {
        let index = self.session.go_to_previous()?;
        self.reset_hint();
        Ok(index)
    }

    /// Start the same quiz again from the first question.
    pub fn restart(&mut self) {
        self.session.restart(self.clock.now());
        self.reset_hint();
        info!(session = %self.session.id(), "quiz session restarted");
    }

    //
    // ─── HINTS ─────────────────────────────────────────────────────────────────
    //

    /// Show the hint panel for the current question.
    pub fn open_hint(&mut self) {
        self.exchange.show();
    }

    /// Hide the hint panel, abandoning any request in flight.
    pub fn close_hint(&mut self) {
        self.reset_hint();
    }

    /// Ask the assistant about the current question.
    ///
    /// # Errors
    ///
    /// Returns `HintRejected` (and changes nothing) if hints are disabled, the
    /// prompt is blank, a request is already pending, or the session is complete.
    pub fn send_hint(&mut self, prompt: &str) -> Result<HintTicket, HintRejected> {
        let Some(hints) = self.hints.as_mut() else {
            return Err(HintRejected::Disabled);
        };
        if prompt.trim().is_empty() {
            return Err(HintRejected::EmptyPrompt);
        }
        if self.exchange.is_pending() {
            return Err(HintRejected::InFlight);
        }
        let Some(question) = self.session.current_question() else {
            return Err(HintRejected::Completed);
        };

        let ticket = hints.issue(self.session.current_index());
        hints.dispatch(ticket, question.prompt(), prompt);
        self.exchange.begin(prompt, ticket);
        Ok(ticket)
    }

    /// Wait for the next hint event. Returns `None` at once when hints are disabled.
    pub async fn next_hint_event(&mut self) -> Option<HintEvent> {
        match self.hints.as_mut() {
            Some(hints) => hints.recv().await,
            None => None,
        }
    }

    /// Fold a hint event into the exchange if it belongs to the active request.
    pub fn apply_hint_event(&mut self, event: HintEvent) -> HintApplied {
        let current = self.session.current_index();
        if event.ticket.question_index() != current
            || self.session.is_complete()
            || !self.exchange.accepts(event.ticket)
        {
            debug!(
                question = event.ticket.question_index(),
                generation = event.ticket.generation(),
                current,
                "discarding stale hint event"
            );
            return HintApplied::Stale;
        }

        match event.kind {
            HintEventKind::Chunk(text) => self.exchange.append(&text),
            HintEventKind::Finished => self.exchange.finish(),
            HintEventKind::Failed(message) => self.exchange.fail(message),
        }
        HintApplied::Applied
    }

    fn reset_hint(&mut self) {
        if let Some(hints) = self.hints.as_mut() {
            hints.cancel();
        }
        self.exchange.reset();
    }
}

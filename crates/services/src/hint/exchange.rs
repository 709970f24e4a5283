/// Tag attached to every hint request: the question it was asked for and a
/// generation number that changes whenever the exchange is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HintTicket {
    question_index: usize,
    generation: u64,
}

impl HintTicket {
    #[must_use]
    pub fn new(question_index: usize, generation: u64) -> Self {
        Self {
            question_index,
            generation,
        }
    }

    #[must_use]
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExchangeStatus {
    #[default]
    Idle,
    Pending,
    Failed(String),
}

/// The hint conversation shown next to the current question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatExchange {
    prompt: String,
    reply: String,
    status: ExchangeStatus,
    visible: bool,
    active: Option<HintTicket>,
}

impl ChatExchange {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn reply(&self) -> &str {
        &self.reply
    }

    #[must_use]
    pub fn status(&self) -> &ExchangeStatus {
        &self.status
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ExchangeStatus::Pending
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn active_ticket(&self) -> Option<HintTicket> {
        self.active
    }

    /// Back to the idle default: no prompt, no reply, hidden.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn show(&mut self) {
        self.visible = true;
    }

    pub(crate) fn begin(&mut self, prompt: &str, ticket: HintTicket) {
        self.prompt = prompt.to_owned();
        self.reply.clear();
        self.status = ExchangeStatus::Pending;
        self.visible = true;
        self.active = Some(ticket);
    }

    /// True if events for `ticket` may still change this exchange.
    #[must_use]
    pub(crate) fn accepts(&self, ticket: HintTicket) -> bool {
        self.is_pending() && self.active == Some(ticket)
    }

    pub(crate) fn append(&mut self, chunk: &str) {
        self.reply.push_str(chunk);
    }

    pub(crate) fn finish(&mut self) {
        self.status = ExchangeStatus::Idle;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = ExchangeStatus::Failed(message);
    }
}

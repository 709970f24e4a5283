mod channel;
mod client;
mod config;
mod exchange;
mod token;

pub use channel::{HintChannel, HintEvent, HintEventKind};
pub use client::{AssistantClient, HintRequest, HttpAssistant, ReplyStream};
pub use config::{HintConfig, HintConfigDraft};
pub use exchange::{ChatExchange, ExchangeStatus, HintTicket};
pub use token::{EnvToken, StaticToken, TokenProvider};

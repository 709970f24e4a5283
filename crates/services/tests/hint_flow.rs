use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use quiz_core::model::{ChoiceDraft, ChoiceId, Question, QuestionDraft};
use quiz_core::time::fixed_now;
use reqwest::StatusCode;
use services::hint::{
    AssistantClient, ExchangeStatus, HintChannel, HintEvent, HintEventKind, HintRequest,
    ReplyStream,
};
use services::quiz::{DiscardSink, HintApplied, QuizController};
use services::{Clock, HintError, HintRejected};
use tokio::sync::mpsc;
use tokio::time::timeout;

type ChunkSender = mpsc::UnboundedSender<Result<String, HintError>>;

enum Scripted {
    Stream(mpsc::UnboundedReceiver<Result<String, HintError>>),
    Status(StatusCode),
}

/// Assistant whose replies are fed by the test through channels.
#[derive(Clone, Default)]
struct ScriptedAssistant {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<HintRequest>>>,
}

impl ScriptedAssistant {
    fn push_stream(&self) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.replies.lock().unwrap().push_back(Scripted::Stream(rx));
        tx
    }

    fn push_status(&self, status: StatusCode) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Scripted::Status(status));
    }

    fn requests(&self) -> Vec<HintRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantClient for ScriptedAssistant {
    async fn stream_reply(&self, request: HintRequest) -> Result<ReplyStream, HintError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Stream(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            Some(Scripted::Status(status)) => Err(HintError::from_status(status)),
            None => Err(HintError::Stream("no scripted reply".into())),
        }
    }
}

fn build_questions() -> Vec<Question> {
    (1..=3)
        .map(|i| {
            QuestionDraft::new(
                format!("q{i}"),
                format!("Prompt {i}"),
                vec![
                    ChoiceDraft::new("A", "right", true),
                    ChoiceDraft::new("B", "wrong", false),
                ],
            )
            .validate()
            .unwrap()
        })
        .collect()
}

fn build_controller(assistant: &ScriptedAssistant) -> QuizController {
    let channel = HintChannel::new(Arc::new(assistant.clone()))
        .with_system_prompt(Some("Give a hint, not the answer.".into()));
    QuizController::new(Clock::fixed(fixed_now()), build_questions(), DiscardSink)
        .unwrap()
        .with_hints(channel)
}

async fn next_event(controller: &mut QuizController) -> HintEvent {
    timeout(Duration::from_secs(2), controller.next_hint_event())
        .await
        .expect("hint event in time")
        .expect("hint channel open")
}

async fn drain_until_settled(controller: &mut QuizController) {
    while controller.exchange().is_pending() {
        let event = next_event(controller).await;
        controller.apply_hint_event(event);
    }
}

#[tokio::test]
async fn chunks_are_appended_in_arrival_order() {
    let assistant = ScriptedAssistant::default();
    let tx = assistant.push_stream();
    let mut controller = build_controller(&assistant);

    controller.send_hint("why is A right?").unwrap();
    assert_eq!(controller.exchange().status(), &ExchangeStatus::Pending);
    assert_eq!(controller.exchange().prompt(), "why is A right?");

    for chunk in ["It ", "means ", "It ", "right."] {
        tx.send(Ok(chunk.to_owned())).unwrap();
    }
    drop(tx);
    drain_until_settled(&mut controller).await;

    assert_eq!(controller.exchange().reply(), "It means It right.");
    assert_eq!(controller.exchange().status(), &ExchangeStatus::Idle);

    let requests = assistant.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contextual_prompt.starts_with("Give a hint, not the answer."));
    assert!(requests[0].contextual_prompt.contains("Question: Prompt 1"));
    assert!(requests[0].contextual_prompt.ends_with("why is A right?"));
}

#[tokio::test]
async fn blank_and_concurrent_requests_are_rejected() {
    let assistant = ScriptedAssistant::default();
    let _tx = assistant.push_stream();
    let mut controller = build_controller(&assistant);

    assert_eq!(
        controller.send_hint("   ").unwrap_err(),
        HintRejected::EmptyPrompt
    );
    assert_eq!(controller.exchange().status(), &ExchangeStatus::Idle);

    controller.send_hint("first").unwrap();
    assert_eq!(
        controller.send_hint("second").unwrap_err(),
        HintRejected::InFlight
    );
    assert_eq!(controller.exchange().prompt(), "first");
}

#[tokio::test]
async fn transport_failure_is_reported_and_recoverable() {
    let assistant = ScriptedAssistant::default();
    assistant.push_status(StatusCode::UNAUTHORIZED);
    let tx = assistant.push_stream();
    let mut controller = build_controller(&assistant);

    controller.send_hint("help").unwrap();
    drain_until_settled(&mut controller).await;
    assert_eq!(
        controller.exchange().status(),
        &ExchangeStatus::Failed("authorization failed (401); sign in again".into())
    );
    assert!(!controller.exchange().is_pending());

    controller.send_hint("help again").unwrap();
    tx.send(Ok("Try the first one.".into())).unwrap();
    drop(tx);
    drain_until_settled(&mut controller).await;
    assert_eq!(controller.exchange().reply(), "Try the first one.");
}

#[tokio::test]
async fn mid_stream_error_keeps_partial_reply() {
    let assistant = ScriptedAssistant::default();
    let tx = assistant.push_stream();
    let mut controller = build_controller(&assistant);

    controller.send_hint("help").unwrap();
    tx.send(Ok("Partial".into())).unwrap();
    tx.send(Err(HintError::Stream("connection reset".into())))
        .unwrap();
    drain_until_settled(&mut controller).await;

    assert_eq!(controller.exchange().reply(), "Partial");
    assert!(matches!(
        controller.exchange().status(),
        ExchangeStatus::Failed(message) if message.contains("connection reset")
    ));
}

#[tokio::test]
async fn late_reply_for_previous_question_is_ignored() {
    let assistant = ScriptedAssistant::default();
    let old_tx = assistant.push_stream();
    let mut controller = build_controller(&assistant);

    let old_ticket = controller.send_hint("hint for q1").unwrap();
    controller.select_answer(&ChoiceId::new("A")).unwrap();
    controller.confirm_and_advance().unwrap();
    assert_eq!(controller.session().current_index(), 1);
    assert_eq!(controller.exchange().prompt(), "");
    assert!(!controller.exchange().is_visible());

    // The old request may already be aborted; either way nothing may land.
    let _ = old_tx.send(Ok("late text".into()));
    if let Ok(Some(event)) = timeout(
        Duration::from_millis(100),
        controller.next_hint_event(),
    )
    .await
    {
        assert_eq!(controller.apply_hint_event(event), HintApplied::Stale);
    }
    assert_eq!(controller.exchange().reply(), "");
    assert_eq!(controller.exchange().status(), &ExchangeStatus::Idle);

    // A fresh request for q2 works and a forged late chunk for q1 is discarded.
    let tx = assistant.push_stream();
    controller.send_hint("hint for q2").unwrap();
    let stale = HintEvent {
        ticket: old_ticket,
        kind: HintEventKind::Chunk("from q1".into()),
    };
    assert_eq!(controller.apply_hint_event(stale), HintApplied::Stale);

    tx.send(Ok("q2 reply".into())).unwrap();
    drop(tx);
    drain_until_settled(&mut controller).await;
    assert_eq!(controller.exchange().reply(), "q2 reply");
    assert_eq!(controller.exchange().prompt(), "hint for q2");
}

#[tokio::test]
async fn navigation_close_and_restart_reset_the_exchange() {
    let assistant = ScriptedAssistant::default();
    let mut controller = build_controller(&assistant);

    controller.select_answer(&ChoiceId::new("A")).unwrap();
    controller.confirm_and_advance().unwrap();

    let _tx = assistant.push_stream();
    controller.send_hint("going back soon").unwrap();
    controller.go_to_previous().unwrap();
    assert_eq!(controller.exchange().prompt(), "");
    assert!(!controller.exchange().is_pending());

    let _tx = assistant.push_stream();
    controller.open_hint();
    controller.send_hint("then close").unwrap();
    controller.close_hint();
    assert_eq!(controller.exchange().prompt(), "");
    assert!(!controller.exchange().is_visible());

    let _tx = assistant.push_stream();
    controller.send_hint("then restart").unwrap();
    controller.restart();
    assert_eq!(controller.exchange().prompt(), "");
    assert_eq!(controller.exchange().reply(), "");
    assert_eq!(controller.exchange().status(), &ExchangeStatus::Idle);
}

#[tokio::test]
async fn hints_are_rejected_when_disabled() {
    let mut controller =
        QuizController::new(Clock::fixed(fixed_now()), build_questions(), DiscardSink).unwrap();

    assert!(!controller.hints_enabled());
    assert_eq!(
        controller.send_hint("help").unwrap_err(),
        HintRejected::Disabled
    );
    assert!(controller.next_hint_event().await.is_none());
}

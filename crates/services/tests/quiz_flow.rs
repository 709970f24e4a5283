use std::sync::{Arc, Mutex};

use quiz_core::model::{ChoiceDraft, ChoiceId, Question, QuestionDraft, QuizSummary};
use quiz_core::time::fixed_now;
use services::quiz::{QuizController, SessionError, SessionPhase, Step};
use services::{Clock, SummaryRecorder};
use storage::repository::{InMemoryRepository, QuizSummaryRepository};

fn build_questions(len: usize) -> Vec<Question> {
    (1..=len)
        .map(|i| {
            QuestionDraft::new(
                format!("q{i}"),
                format!("Prompt {i}"),
                vec![
                    ChoiceDraft::new("A", "right", true),
                    ChoiceDraft::new("B", "wrong", false),
                    ChoiceDraft::new("C", "wrong too", false),
                ],
            )
            .validate()
            .unwrap()
        })
        .collect()
}

type Calls = Arc<Mutex<Vec<(u32, u32)>>>;

fn build_controller(len: usize) -> (QuizController, Calls) {
    let calls: Calls = Arc::default();
    let sink_calls = Arc::clone(&calls);
    let controller = QuizController::new(
        Clock::fixed(fixed_now()),
        build_questions(len),
        move |summary: &QuizSummary| {
            sink_calls
                .lock()
                .unwrap()
                .push((summary.score(), summary.total()));
        },
    )
    .unwrap();
    (controller, calls)
}

fn answer(controller: &mut QuizController, choice: &str) {
    controller.select_answer(&ChoiceId::new(choice)).unwrap();
    controller.confirm_and_advance().unwrap();
    let session = controller.session();
    assert_eq!(
        session.score(),
        session.answers().count_correct(session.questions())
    );
}

#[test]
fn answering_a_b_a_scores_two_of_three() {
    let (mut controller, calls) = build_controller(3);

    answer(&mut controller, "A");
    answer(&mut controller, "B");
    answer(&mut controller, "A");

    assert_eq!(
        controller.session().phase(),
        SessionPhase::Completed { score: 2, total: 3 }
    );
    assert_eq!(*calls.lock().unwrap(), vec![(2, 3)]);
}

#[test]
fn completion_sink_is_called_exactly_once() {
    let (mut controller, calls) = build_controller(2);
    answer(&mut controller, "A");
    answer(&mut controller, "A");

    assert_eq!(
        controller.select_answer(&ChoiceId::new("A")).unwrap_err(),
        SessionError::Completed
    );
    assert_eq!(
        controller.confirm_and_advance().unwrap_err(),
        SessionError::Completed
    );
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn back_navigation_shows_previous_answer() {
    let (mut controller, _calls) = build_controller(3);

    controller.select_answer(&ChoiceId::new("A")).unwrap();
    assert_eq!(
        controller.go_to_previous().unwrap_err(),
        SessionError::AtFirstQuestion
    );
    controller.confirm_and_advance().unwrap();
    answer(&mut controller, "B");
    controller.select_answer(&ChoiceId::new("C")).unwrap();

    controller.go_to_previous().unwrap();
    controller.go_to_previous().unwrap();

    let view = controller.view().unwrap();
    assert_eq!(view.index, 0);
    let selected: Vec<_> = view
        .choices
        .iter()
        .filter(|c| c.selected)
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(selected, vec!["A"]);
    assert_eq!(
        controller.session().tentative(),
        Some(&ChoiceId::new("A"))
    );
}

#[test]
fn revisiting_and_reanswering_keeps_one_entry() {
    let (mut controller, calls) = build_controller(2);
    answer(&mut controller, "A");
    controller.go_to_previous().unwrap();
    answer(&mut controller, "B");
    answer(&mut controller, "A");

    let session = controller.session();
    assert_eq!(session.answers().len(), 2);
    assert_eq!(session.answers().get(0), Some(&ChoiceId::new("B")));
    assert_eq!(*calls.lock().unwrap(), vec![(1, 2)]);
}

#[test]
fn restart_allows_a_second_report() {
    let (mut controller, calls) = build_controller(1);
    answer(&mut controller, "B");
    let first = controller.session().id();

    controller.restart();
    assert_eq!(
        controller.session().phase(),
        SessionPhase::InProgress { index: 0 }
    );
    assert_ne!(controller.session().id(), first);

    controller.select_answer(&ChoiceId::new("A")).unwrap();
    let advance = controller.confirm_and_advance().unwrap();
    assert!(matches!(advance.step, Step::Completed(_)));
    assert_eq!(*calls.lock().unwrap(), vec![(0, 1), (1, 1)]);
}

#[tokio::test]
async fn completed_sessions_are_persisted_by_the_recorder() {
    let repo = InMemoryRepository::new();
    let (sink, recorder) = SummaryRecorder::spawn(Arc::new(repo.clone()));
    let mut controller =
        QuizController::new(Clock::fixed(fixed_now()), build_questions(3), sink).unwrap();

    while !controller.session().is_complete() {
        answer(&mut controller, "A");
    }
    let session_id = controller.session().id();
    drop(controller);

    let report = recorder.finish().await;
    assert_eq!(report.stored, 1);
    let rows = repo.list_recent(5).await.unwrap();
    assert_eq!(rows[0].summary.session_id(), session_id);
    assert_eq!(rows[0].summary.score(), 3);
}

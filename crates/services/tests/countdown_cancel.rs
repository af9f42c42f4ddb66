//! Countdown task behavior: it drives the session to auto-submit and it
//! must stop dead when dropped.

use std::sync::Arc;
use std::time::Duration;

use api::InMemoryGateway;
use exam_core::model::{ChoiceOption, Question, QuestionId, QuestionKind, Test, TestId};
use services::{Countdown, SessionController, SessionPhase};

fn seeded_gateway() -> InMemoryGateway {
    let question = Question::new(
        QuestionId::new(1),
        QuestionKind::MultipleChoice,
        "Pick one",
        1,
        0,
        vec![
            ChoiceOption::new("a").unwrap(),
            ChoiceOption::new("b").unwrap(),
        ],
        None,
    )
    .unwrap();
    let test = Test::new(
        TestId::new(1),
        "Timing",
        None,
        Some(1),
        1,
        50,
        None,
        vec![question],
    )
    .unwrap();
    let gateway = InMemoryGateway::new();
    gateway.insert_test(test);
    gateway
}

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

#[tokio::test]
async fn countdown_drives_the_attempt_to_auto_submit() {
    let gateway = seeded_gateway();
    let controller = Arc::new(SessionController::new(
        Arc::new(gateway.clone()),
        Arc::new(gateway.clone()),
    ));
    controller.initialize(TestId::new(1)).await.unwrap();

    // 60 seconds of test time at 2ms per tick
    let countdown = Countdown::spawn_with_period(controller.clone(), Duration::from_millis(2));

    assert!(eventually(|| controller.phase() == SessionPhase::Submitted).await);
    assert!(gateway.is_submitted(controller.attempt_id().unwrap()));

    // the task notices the terminal phase and stops on its own
    assert!(eventually(|| countdown.is_stopped()).await);
}

#[tokio::test]
async fn dropping_the_countdown_stops_the_timer() {
    let gateway = seeded_gateway();
    let controller = Arc::new(SessionController::new(
        Arc::new(gateway.clone()),
        Arc::new(gateway.clone()),
    ));
    controller.initialize(TestId::new(1)).await.unwrap();

    let countdown = Countdown::spawn_with_period(controller.clone(), Duration::from_millis(20));
    // wait until at least one tick has landed
    assert!(
        eventually(|| {
            controller
                .progress()
                .map(|p| p.remaining_secs != Some(60))
                .unwrap_or(false)
        })
        .await
    );

    drop(countdown);
    // let any tick that was already in flight land
    tokio::time::sleep(Duration::from_millis(50)).await;

    let frozen = controller.progress().unwrap().remaining_secs;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(controller.progress().unwrap().remaining_secs, frozen);
    assert_eq!(controller.phase(), SessionPhase::Active);
    assert!(!gateway.is_submitted(controller.attempt_id().unwrap()));
}

#[tokio::test]
async fn stop_halts_the_timer_without_dropping_the_handle() {
    let gateway = seeded_gateway();
    let controller = Arc::new(SessionController::new(
        Arc::new(gateway.clone()),
        Arc::new(gateway.clone()),
    ));
    controller.initialize(TestId::new(1)).await.unwrap();

    let countdown = Countdown::spawn_with_period(controller.clone(), Duration::from_millis(20));
    countdown.stop();
    assert!(eventually(|| countdown.is_stopped()).await);

    let frozen = controller.progress().unwrap().remaining_secs;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(controller.progress().unwrap().remaining_secs, frozen);
    assert_eq!(controller.phase(), SessionPhase::Active);
}

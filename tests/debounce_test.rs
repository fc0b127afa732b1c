use std::time::Duration;

use rostercli::management::Debouncer;
use tokio::time::{advance, timeout};

const QUIET: Duration = Duration::from_millis(500);

// Lets the debouncer task observe everything pushed so far.
async fn settle_tasks() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_rapid_input_emits_only_latest_value() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("a".to_string());
    settle_tasks().await;
    advance(Duration::from_millis(100)).await;
    debouncer.push("ab".to_string());
    settle_tasks().await;
    advance(Duration::from_millis(100)).await;
    debouncer.push("abc".to_string());
    settle_tasks().await;

    assert_eq!(debouncer.next_settled().await.as_deref(), Some("abc"));

    // nothing else is pending afterwards
    advance(QUIET * 4).await;
    settle_tasks().await;
    assert_eq!(debouncer.try_settled(), None);
}

#[tokio::test(start_paused = true)]
async fn test_value_is_held_back_for_the_quiet_period() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("ann".to_string());
    settle_tasks().await;
    advance(Duration::from_millis(400)).await;
    settle_tasks().await;
    assert_eq!(debouncer.try_settled(), None);

    advance(Duration::from_millis(150)).await;
    settle_tasks().await;
    assert_eq!(debouncer.try_settled().as_deref(), Some("ann"));
}

#[tokio::test(start_paused = true)]
async fn test_each_change_restarts_the_timer() {
    let debouncer = Debouncer::new(QUIET);

    // keep typing every 400ms for two seconds; the timer never runs out
    for i in 0..5 {
        debouncer.push(format!("term{i}"));
        settle_tasks().await;
        advance(Duration::from_millis(400)).await;
        settle_tasks().await;
        assert_eq!(debouncer.try_settled(), None);
    }

    advance(Duration::from_millis(200)).await;
    settle_tasks().await;
    assert_eq!(debouncer.try_settled().as_deref(), Some("term4"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_string_settles() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("ann".to_string());
    settle_tasks().await;
    debouncer.push(String::new());

    let settled = timeout(QUIET * 2, debouncer.next_settled()).await;
    assert_eq!(settled.unwrap().as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_separate_bursts_emit_separately() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("first".to_string());
    assert_eq!(debouncer.next_settled().await.as_deref(), Some("first"));

    debouncer.push("second".to_string());
    assert_eq!(debouncer.next_settled().await.as_deref(), Some("second"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_drops_waiting_value() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("old".to_string());
    settle_tasks().await;
    debouncer.cancel();
    advance(QUIET * 2).await;
    settle_tasks().await;

    assert_eq!(debouncer.try_settled(), None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_drops_emitted_value() {
    let debouncer = Debouncer::new(QUIET);

    debouncer.push("old".to_string());
    settle_tasks().await;
    advance(QUIET * 2).await;
    settle_tasks().await;
    debouncer.cancel();

    assert_eq!(debouncer.try_settled(), None);

    debouncer.push("new".to_string());
    assert_eq!(debouncer.next_settled().await.as_deref(), Some("new"));
}

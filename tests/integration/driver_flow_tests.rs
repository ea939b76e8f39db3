//! Integration tests for the scripted exchange, run against an in-process
//! fake engine over a duplex pipe.

use std::time::Duration;

use serde_json::{json, Value};

use tbp_probe::models::queue::Queue;
use tbp_probe::tbp::driver::{ReadyBound, ReadyOutcome, Script};

use super::test_helpers::{kind, kinds, FakeEngine, PipeDriver};

fn script(queue: &str) -> Script {
    Script::new(Queue::parse(queue).unwrap(), 40, 10).with_suggest_delay(Duration::ZERO)
}

/// Engine that answers `rules` with `ready` and the n-th `suggest` with the
/// n-th entry of `replies` (nothing once they run out).
fn engine(replies: &[&str]) -> FakeEngine<impl FnMut(&Value) -> Vec<String> + Send> {
    let mut replies = replies
        .iter()
        .map(|r| (*r).to_owned())
        .collect::<Vec<_>>()
        .into_iter();
    FakeEngine::new(move |msg: &Value| match kind(msg) {
        "rules" => vec![r#"{"type":"ready"}"#.to_owned()],
        "suggest" => replies.next().into_iter().collect(),
        _ => Vec::new(),
    })
}

async fn finish(driver: PipeDriver, engine: tokio::task::JoinHandle<Vec<Value>>) -> Vec<Value> {
    drop(driver.close().await);
    engine.await.expect("engine task")
}

// ── Documented end-to-end scenario ───────────────────────────────────────────

/// Queue `I,O,T`, immediate `ready`, empty first suggestion, `O2` on the
/// retry: the probe retries once, plays `O2`, announces `O`, suggests again,
/// then stops and quits.
#[tokio::test]
async fn empty_first_suggestion_is_retried_then_played() {
    let (mut driver, handle) = engine(&[
        r#"{"type":"suggestion","moves":[]}"#,
        r#"{"type":"suggestion","moves":["O2"]}"#,
        r#"{"type":"suggestion","moves":["T3"]}"#,
    ])
    .spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(
        kinds(&sent),
        ["rules", "start", "suggest", "suggest", "play", "new_piece", "suggest", "stop", "quit"]
    );
    assert_eq!(sent[4], json!({"type": "play", "move": "O2"}));
    assert_eq!(sent[5], json!({"type": "new_piece", "piece": "O"}));

    assert_eq!(report.ready, ReadyOutcome::Ready);
    assert!(report.retried);
    assert_eq!(report.played, Some(json!("O2")));
    assert!(report.stopped);
}

#[tokio::test]
async fn start_message_describes_empty_default_board() {
    let (mut driver, handle) = engine(&[r#"{"moves":["X1"]}"#, "{}"]).spawn();

    driver.run(&script("i,o,t")).await.expect("run");
    let sent = finish(driver, handle).await;

    let start = &sent[1];
    assert_eq!(kind(start), "start");
    let rows = start["board"].as_array().expect("board rows");
    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|row| row
        .as_array()
        .is_some_and(|cells| cells.len() == 10 && cells.iter().all(Value::is_null))));
    assert_eq!(start["queue"], json!(["I", "O", "T"]));
    assert_eq!(start["hold"], Value::Null);
    assert_eq!(start["combo"], json!(0));
    assert_eq!(start["back_to_back"], json!(false));
}

#[tokio::test]
async fn first_suggested_move_is_echoed_verbatim() {
    let (mut driver, handle) = engine(&[r#"{"moves":["X1","X2"]}"#, "{}"]).spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(!report.retried, "a non-empty reply must not trigger the retry");
    assert_eq!(
        kinds(&sent),
        ["rules", "start", "suggest", "play", "new_piece", "suggest", "stop", "quit"]
    );
    assert_eq!(sent[3], json!({"type": "play", "move": "X1"}));
}

#[tokio::test]
async fn structured_move_is_echoed_unchanged() {
    let mv = json!({"location": {"type": "I", "orientation": "north", "x": 4, "y": 0}, "spin": "none"});
    let reply = json!({"type": "suggestion", "moves": [mv]}).to_string();
    let (mut driver, handle) = engine(&[reply.as_str(), "{}"]).spawn();

    driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    let play = sent.iter().find(|m| kind(m) == "play").expect("play sent");
    assert_eq!(play["move"], mv);
}

// ── Retry-once policy ────────────────────────────────────────────────────────

#[tokio::test]
async fn retry_happens_at_most_once() {
    let (mut driver, handle) = engine(&[
        r#"{"type":"suggestion","moves":[]}"#,
        r#"{"type":"suggestion","moves":[]}"#,
        r#"{"type":"suggestion","moves":["late"]}"#,
    ])
    .spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(report.retried);
    assert_eq!(report.played, None);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "suggest", "stop", "quit"]);
}

#[tokio::test]
async fn malformed_reply_is_not_retried() {
    let (mut driver, handle) = engine(&["this is not json", r#"{"moves":["X"]}"#]).spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(!report.retried);
    assert_eq!(report.played, None);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "stop", "quit"]);
}

#[tokio::test]
async fn reply_without_moves_field_is_not_retried() {
    let (mut driver, handle) = engine(&[r#"{"type":"error","reason":"unsupported"}"#]).spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(!report.retried);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "stop", "quit"]);
}

#[tokio::test]
async fn empty_valued_first_move_is_not_played() {
    for reply in [
        r#"{"moves":[""]}"#,
        r#"{"moves":[0]}"#,
        r#"{"moves":[false]}"#,
        r#"{"moves":[{}]}"#,
        r#"{"moves":[[]]}"#,
    ] {
        let (mut driver, handle) = engine(&[reply]).spawn();

        let report = driver.run(&script("I,O,T")).await.expect("run");
        let sent = finish(driver, handle).await;

        assert_eq!(report.played, None, "reply: {reply}");
        assert_eq!(
            kinds(&sent),
            ["rules", "start", "suggest", "stop", "quit"],
            "reply: {reply}"
        );
    }
}

// ── Next-piece notification ──────────────────────────────────────────────────

#[tokio::test]
async fn single_piece_queue_announces_same_piece() {
    let (mut driver, handle) = engine(&[r#"{"moves":["S1"]}"#, "{}"]).spawn();

    driver.run(&script("s")).await.expect("run");
    let sent = finish(driver, handle).await;

    let new_piece = sent.iter().find(|m| kind(m) == "new_piece").expect("new_piece sent");
    assert_eq!(new_piece["piece"], "S");
}

// ── Stop / quit ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_stop_skips_stop_and_quit() {
    let (mut driver, handle) = engine(&[r#"{"moves":["X1"]}"#, "{}"]).spawn();

    let report = driver.run(&script("I,O,T").with_stop(false)).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(!report.stopped);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "play", "new_piece", "suggest"]);
}

// ── Ready drain ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn noise_before_ready_is_drained() {
    let (mut driver, handle) = FakeEngine::new(|msg: &Value| match kind(msg) {
        "rules" => vec![
            r#"{"type":"log","text":"warming up"}"#.to_owned(),
            "plain text line".to_owned(),
            r#"{"type":"ready"}"#.to_owned(),
        ],
        "suggest" => vec![r#"{"moves":["X1"]}"#.to_owned()],
        _ => Vec::new(),
    })
    .spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(report.ready, ReadyOutcome::Ready);
    assert_eq!(report.played, Some(json!("X1")));
    assert_eq!(kind(&sent[1]), "start");
}

#[tokio::test]
async fn silent_engine_hits_ready_time_bound_and_probe_continues() {
    let (mut driver, handle) = FakeEngine::new(|msg: &Value| match kind(msg) {
        "suggest" => vec![r#"{"moves":["X1"]}"#.to_owned()],
        _ => Vec::new(),
    })
    .spawn();

    let bound = ReadyBound {
        max_lines: 16,
        timeout: Duration::from_millis(100),
    };
    let report = driver
        .run(&script("I,O,T").with_ready_bound(bound))
        .await
        .expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(report.ready, ReadyOutcome::TimedOut);
    assert_eq!(report.played, Some(json!("X1")));
    assert_eq!(kind(&sent[1]), "start");
}

#[tokio::test]
async fn chatty_engine_hits_ready_line_bound() {
    let (mut driver, handle) = FakeEngine::new(|msg: &Value| match kind(msg) {
        "rules" => (0..5).map(|i| format!(r#"{{"type":"log","n":{i}}}"#)).collect(),
        _ => Vec::new(),
    })
    .spawn();

    let bound = ReadyBound {
        max_lines: 3,
        timeout: Duration::from_secs(5),
    };
    let report = driver
        .run(&script("I,O,T").with_ready_bound(bound))
        .await
        .expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(report.ready, ReadyOutcome::LineLimit);
    assert_eq!(report.played, None, "leftover log lines carry no moves");
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "stop", "quit"]);
}

// ── Oversized lines ─────────────────────────────────────────────────────────

#[tokio::test]
async fn megabyte_reply_is_read_and_played() {
    let padding = "x".repeat(1_100_000);
    let reply = format!(r#"{{"moves":["X1"],"pad":"{padding}"}}"#);
    let (mut driver, handle) = engine(&[reply.as_str(), r#"{"moves":[]}"#]).spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(report.played, Some(json!("X1")));
    assert_eq!(
        kinds(&sent),
        ["rules", "start", "suggest", "play", "new_piece", "suggest", "stop", "quit"]
    );
}

#[tokio::test]
async fn reply_over_line_cap_is_skipped_as_no_move() {
    let reply = format!(r#"{{"moves":["X1"],"pad":"{}"}}"#, "x".repeat(4096));
    let mut engine = engine(&[reply.as_str()]);
    engine.max_line_bytes = 1024;
    let (mut driver, handle) = engine.spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert!(!report.retried);
    assert_eq!(report.played, None);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "stop", "quit"]);
}

#[tokio::test]
async fn oversized_noise_before_ready_counts_as_one_line() {
    let noise = format!(r#"{{"type":"log","text":"{}"}}"#, "x".repeat(4096));
    let mut engine = FakeEngine::new(move |msg: &Value| match kind(msg) {
        "rules" => vec![noise.clone(), r#"{"type":"ready"}"#.to_owned()],
        _ => Vec::new(),
    });
    engine.max_line_bytes = 1024;
    let (mut driver, handle) = engine.spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    drop(finish(driver, handle).await);

    assert_eq!(report.ready, ReadyOutcome::Ready);
}

// ── End-of-file ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn closed_output_is_treated_as_no_data() {
    let mut engine = FakeEngine::new(|_: &Value| Vec::new());
    engine.greeting = None;
    engine.hang_up = true;
    let (mut driver, handle) = engine.spawn();

    let report = driver.run(&script("I,O,T")).await.expect("run");
    let sent = finish(driver, handle).await;

    assert_eq!(report.ready, ReadyOutcome::Eof);
    assert!(!report.retried);
    assert_eq!(report.played, None);
    assert_eq!(kinds(&sent), ["rules", "start", "suggest", "stop", "quit"]);
}

#[tokio::test]
async fn write_to_vanished_engine_is_an_error() {
    let (probe_side, engine_side) = tokio::io::duplex(1024);
    drop(engine_side);
    let (rx, tx) = tokio::io::split(probe_side);
    let mut driver = tbp_probe::tbp::driver::Driver::new(rx, tx);

    let result = driver.run(&script("I,O,T")).await;
    assert!(
        matches!(result, Err(tbp_probe::AppError::Io(_))),
        "expected AppError::Io, got: {result:?}"
    );
}

use super::*;
use crate::frame::{Point, SenderId, Stroke};
use crate::state::test_helpers;
use serde_json::json;
use tokio::time::{Duration, timeout};

async fn recv_frame(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed unexpectedly")
}

async fn assert_no_frame(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no frame"
    );
}

/// Register a participant and consume its history frame.
async fn join(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
    let client_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(32);
    services::session::register(state, client_id, tx)
        .await
        .expect("register should succeed");
    assert!(matches!(recv_frame(&mut rx).await, Frame::History { .. }));
    (client_id, rx)
}

fn red(points: &[(f64, f64)]) -> Stroke {
    let mut stroke = Stroke::new("#ff0000", 3.0);
    for (x, y) in points {
        stroke.push(Point::new(*x, *y));
    }
    stroke
}

#[tokio::test]
async fn preview_then_stroke_scenario() {
    let state = test_helpers::test_app_state();
    let (a, mut a_rx) = join(&state).await;
    let (_b, mut b_rx) = join(&state).await;

    let preview = json!({
        "type": "stroke-update",
        "stroke": {"points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}], "color": "#ff0000", "width": 3},
        "senderId": "a1"
    })
    .to_string();
    let finalized = json!({
        "type": "stroke",
        "stroke": {"points": [{"x": 0, "y": 0}, {"x": 1, "y": 1}, {"x": 2, "y": 2}], "color": "#ff0000", "width": 3},
        "senderId": "a1"
    })
    .to_string();

    assert_eq!(process_inbound_text(&state, a, &preview).await, Outcome::Relayed(1));
    assert_eq!(process_inbound_text(&state, a, &finalized).await, Outcome::Appended(0));

    let three = red(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(
        recv_frame(&mut b_rx).await,
        Frame::preview(red(&[(0.0, 0.0), (1.0, 1.0)]), SenderId::from("a1"))
    );
    assert_eq!(recv_frame(&mut b_rx).await, Frame::stroke(three.clone(), Some(SenderId::from("a1"))));

    // The sender only sees its own finalized stroke echoed, never its preview.
    assert_eq!(recv_frame(&mut a_rx).await, Frame::stroke(three.clone(), Some(SenderId::from("a1"))));
    assert_no_frame(&mut a_rx).await;

    let log = services::stroke::snapshot_history(&state).await;
    assert_eq!(log, vec![three]);
}

#[tokio::test]
async fn malformed_payloads_leave_log_untouched() {
    let state = test_helpers::test_app_state();
    let (a, _a_rx) = join(&state).await;
    let (_b, mut b_rx) = join(&state).await;

    let payloads = [
        "garbage".to_string(),
        "{}".to_string(),
        json!({"type": "stroke"}).to_string(),
        json!({"type": "stroke", "stroke": {"points": [{"x": 0, "y": 0}], "color": "#000"}}).to_string(),
        json!({"type": "stroke", "stroke": {"points": [{"x": "0", "y": 0}], "color": "#000", "width": 1}})
            .to_string(),
        json!({"type": "stroke-update", "stroke": {"points": [{"x": 0, "y": 0}], "color": "#000", "width": 1}})
            .to_string(),
        json!({"type": "wipe"}).to_string(),
    ];
    for payload in &payloads {
        assert_eq!(process_inbound_text(&state, a, payload).await, Outcome::Dropped, "{payload}");
    }

    assert!(services::stroke::snapshot_history(&state).await.is_empty());
    assert_no_frame(&mut b_rx).await;
}

#[tokio::test]
async fn client_sent_history_is_ignored() {
    let state = test_helpers::test_app_state();
    let (a, _a_rx) = join(&state).await;
    let text = frame::encode(&Frame::history(vec![test_helpers::diagonal_stroke(2, "#000000")])).unwrap();

    assert_eq!(process_inbound_text(&state, a, &text).await, Outcome::Dropped);
    assert!(services::stroke::snapshot_history(&state).await.is_empty());
}

#[tokio::test]
async fn stroke_without_sender_id_is_appended_and_relayed_without_one() {
    let state = test_helpers::test_app_state();
    let (a, _a_rx) = join(&state).await;
    let (_b, mut b_rx) = join(&state).await;
    let stroke = test_helpers::diagonal_stroke(2, "#0000ff");
    let text = frame::encode(&Frame::stroke(stroke.clone(), None)).unwrap();

    assert_eq!(process_inbound_text(&state, a, &text).await, Outcome::Appended(0));
    assert_eq!(recv_frame(&mut b_rx).await, Frame::stroke(stroke, None));
}

#[tokio::test]
async fn connected_participants_converge_on_log_order() {
    let state = test_helpers::test_app_state();
    let (a, mut a_rx) = join(&state).await;
    let (b, mut b_rx) = join(&state).await;

    for (i, origin) in [a, b, a, b, b].into_iter().enumerate() {
        let mut stroke = test_helpers::diagonal_stroke(2, "#123456");
        stroke.width = 1.0 + f64::from(u8::try_from(i).unwrap());
        let text = frame::encode(&Frame::stroke(stroke, Some(SenderId::generate()))).unwrap();
        process_inbound_text(&state, origin, &text).await;
    }

    let log = services::stroke::snapshot_history(&state).await;
    for rx in [&mut a_rx, &mut b_rx] {
        let mut seen = Vec::new();
        for _ in 0..log.len() {
            let Frame::Stroke { stroke, .. } = recv_frame(rx).await else {
                panic!("expected stroke frame");
            };
            seen.push(stroke);
        }
        assert_eq!(seen, log);
    }
}

#[tokio::test]
async fn late_joiner_matches_participant_connected_throughout() {
    let state = test_helpers::test_app_state();
    let (a, mut a_rx) = join(&state).await;
    for color in ["#010101", "#020202", "#030303"] {
        let text = frame::encode(&Frame::stroke(test_helpers::diagonal_stroke(2, color), None)).unwrap();
        process_inbound_text(&state, a, &text).await;
    }

    let mut observed = Vec::new();
    for _ in 0..3 {
        let Frame::Stroke { stroke, .. } = recv_frame(&mut a_rx).await else {
            panic!("expected stroke frame");
        };
        observed.push(stroke);
    }

    let (tx, mut late_rx) = mpsc::channel(8);
    services::session::register(&state, Uuid::new_v4(), tx).await.unwrap();
    assert_eq!(recv_frame(&mut late_rx).await, Frame::history(observed));
}

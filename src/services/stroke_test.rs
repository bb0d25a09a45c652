use super::*;
use crate::state::test_helpers;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

async fn recv_frame(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed")
}

async fn assert_no_frame(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no frame"
    );
}

async fn connect(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
    let client_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(32);
    state.canvas.write().await.clients.insert(client_id, tx);
    (client_id, rx)
}

#[tokio::test]
async fn append_grows_log_and_returns_index() {
    let state = test_helpers::test_app_state();
    let first = append(&state, test_helpers::diagonal_stroke(2, "#ff0000"), None).await;
    let second = append(&state, test_helpers::diagonal_stroke(3, "#00ff00"), None).await;

    assert_eq!((first, second), (0, 1));
    let history = snapshot_history(&state).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].color, "#00ff00");
}

#[tokio::test]
async fn append_fans_out_to_everyone_including_sender() {
    let state = test_helpers::test_app_state();
    let (_sender, mut sender_rx) = connect(&state).await;
    let (_peer, mut peer_rx) = connect(&state).await;
    let stroke = test_helpers::diagonal_stroke(3, "#ff0000");
    let sender_id = SenderId::from("a1");

    append(&state, stroke.clone(), Some(sender_id.clone())).await;

    let expected = Frame::stroke(stroke, Some(sender_id));
    assert_eq!(recv_frame(&mut sender_rx).await, expected);
    assert_eq!(recv_frame(&mut peer_rx).await, expected);
}

#[tokio::test]
async fn appends_arrive_in_log_order() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = connect(&state).await;

    for width in 1..=5_u8 {
        let mut stroke = test_helpers::diagonal_stroke(1, "#000000");
        stroke.width = f64::from(width);
        append(&state, stroke, None).await;
    }

    let history = snapshot_history(&state).await;
    for expected in history {
        let Frame::Stroke { stroke, .. } = recv_frame(&mut rx).await else {
            panic!("expected stroke frame");
        };
        assert_eq!(stroke, expected);
    }
}

#[tokio::test]
async fn concurrent_appends_are_serialized() {
    let state = test_helpers::test_app_state();
    let (_peer, mut rx) = connect(&state).await;

    let mut handles = Vec::new();
    for i in 0..16_u8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let mut stroke = test_helpers::diagonal_stroke(1, "#000000");
            stroke.width = f64::from(i + 1);
            append(&state, stroke, None).await
        }));
    }
    for handle in handles {
        handle.await.expect("append task panicked");
    }

    let history = snapshot_history(&state).await;
    assert_eq!(history.len(), 16);
    for expected in history {
        let Frame::Stroke { stroke, .. } = recv_frame(&mut rx).await else {
            panic!("expected stroke frame");
        };
        assert_eq!(stroke, expected, "peer order must equal log order");
    }
}

#[tokio::test]
async fn relay_preview_excludes_origin_and_leaves_log_alone() {
    let state = test_helpers::test_app_state();
    let (origin, mut origin_rx) = connect(&state).await;
    let (_peer, mut peer_rx) = connect(&state).await;
    let stroke = test_helpers::diagonal_stroke(2, "#ff0000");

    let delivered = relay_preview(&state, origin, SenderId::from("a1"), stroke.clone()).await;

    assert_eq!(delivered, 1);
    assert_eq!(recv_frame(&mut peer_rx).await, Frame::preview(stroke, SenderId::from("a1")));
    assert_no_frame(&mut origin_rx).await;
    assert!(snapshot_history(&state).await.is_empty());
}

#[tokio::test]
async fn history_frame_mirrors_log() {
    let state = test_helpers::test_app_state();
    append(&state, test_helpers::diagonal_stroke(2, "#ff0000"), None).await;

    let canvas = state.canvas.read().await;
    let Frame::History { strokes } = history_frame(&canvas) else {
        panic!("expected history frame");
    };
    assert_eq!(strokes, canvas.log.snapshot());
}

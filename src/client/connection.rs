//! Connection — runs a participant against a live server socket.
//!
//! DESIGN
//! ======
//! One `select!` loop serializes every event source: inbound socket
//! frames, local `DrawInput`, the preview publisher's tick, and a periodic
//! sweep for stale previews. After any event that changes what is drawn,
//! the current scene is published on a `watch` channel.
//!
//! When the input channel closes, any open gesture is finalized and the
//! loop keeps reading until every own stroke has been echoed back, then
//! closes the socket. No retries: a dropped socket ends the run.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::client::participant::{DrawInput, Participant};
use crate::client::sync::Scene;
use crate::config::ClientConfig;
use crate::frame::{self, Frame, FrameError, SenderId};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket transport failed: {0}")]
    Transport(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame encode failed: {0}")]
    Encode(#[from] FrameError),
}

/// Connect to `url` and run until the server closes the socket, or until
/// `input` closes and all own strokes are acknowledged.
///
/// Returns the sender id used for this connection.
///
/// # Errors
///
/// Returns an error if the connection cannot be established or the socket
/// fails mid-run.
pub async fn run(
    url: &str,
    config: ClientConfig,
    mut input: mpsc::Receiver<DrawInput>,
    scene_tx: watch::Sender<Scene>,
) -> Result<SenderId, ClientError> {
    let (mut socket, _) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connect(Box::new(e)))?;

    let mut participant = Participant::new(config);
    let sender_id = participant.engine().self_id().clone();
    info!(%url, %sender_id, "client: connected");

    let mut sweep = tokio::time::interval(config.preview_stale_after);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut input_open = true;

    loop {
        tokio::select! {
            msg = socket.next() => {
                let Some(msg) = msg else { break };
                match msg.map_err(|e| ClientError::Transport(Box::new(e)))? {
                    Message::Text(text) => {
                        if participant.handle_text(text.as_str(), Instant::now()).is_some() {
                            scene_tx.send_replace(participant.scene());
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            event = input.recv(), if input_open => {
                let frames = match event {
                    Some(event) => participant.handle_input(event),
                    None => {
                        input_open = false;
                        participant.finish_gesture().into_iter().collect()
                    }
                };
                for frame in &frames {
                    send_frame(&mut socket, frame).await?;
                }
                scene_tx.send_replace(participant.scene());
            }
            () = participant.next_tick() => {
                if let Some(preview) = participant.handle_tick() {
                    send_frame(&mut socket, &preview).await?;
                }
            }
            _ = sweep.tick() => {
                let evicted = participant.prune(Instant::now());
                if evicted > 0 {
                    debug!(evicted, "client: evicted stale previews");
                    scene_tx.send_replace(participant.scene());
                }
            }
        }

        if !input_open && participant.engine().unacked_len() == 0 {
            if let Err(e) = socket.close(None).await {
                debug!(error = %e, "client: close handshake failed");
            }
            break;
        }
    }

    info!(%sender_id, history = participant.engine().history().len(), "client: disconnected");
    Ok(sender_id)
}

async fn send_frame(socket: &mut Socket, frame: &Frame) -> Result<(), ClientError> {
    let text = frame::encode(frame)?;
    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| ClientError::Transport(Box::new(e)))
}

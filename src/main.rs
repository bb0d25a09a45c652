use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use sketchsync::client::connection::{self, ClientError};
use sketchsync::client::participant::DrawInput;
use sketchsync::client::sync::Scene;
use sketchsync::config::{ClientConfig, ConfigError, ServerConfig};
use sketchsync::frame::{FrameError, Point, Stroke};
use sketchsync::{routes, state};

#[derive(Debug, thiserror::Error)]
enum MainError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: std::net::SocketAddr, source: std::io::Error },
    #[error("server failed: {0}")]
    Serve(std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid stroke: {0}")]
    InvalidStroke(#[from] FrameError),
    #[error("invalid point '{0}', expected x,y")]
    InvalidPoint(String),
    #[error("timed out waiting for the server to acknowledge the stroke")]
    Timeout,
    #[error("client task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Parser, Debug)]
#[command(name = "sketchsync", about = "Shared freehand canvas server and participants")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the canvas server (default).
    Serve,
    /// Connect, draw one stroke through the given points, and exit once acknowledged.
    Draw(DrawArgs),
    /// Connect and log every change to the shared canvas.
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct DrawArgs {
    #[arg(long, env = "SKETCH_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    #[arg(long, default_value = "#000000")]
    color: String,

    #[arg(long, default_value_t = 3.0)]
    width: f64,

    /// Delay between successive points, in milliseconds.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,

    /// Points as `x,y`, in drawing order.
    #[arg(required = true, allow_hyphen_values = true)]
    points: Vec<String>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, env = "SKETCH_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_serve().await,
        Command::Draw(args) => run_draw(args).await,
        Command::Watch(args) => run_watch(args).await,
    }
}

async fn run_serve() -> Result<(), MainError> {
    let config = ServerConfig::from_env()?;
    let state = state::AppState::new(config);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| MainError::Bind { addr: config.addr, source })?;

    info!(addr = %config.addr, "sketchsync listening");
    axum::serve(listener, app).await.map_err(MainError::Serve)
}

async fn run_draw(args: DrawArgs) -> Result<(), MainError> {
    let points = args
        .points
        .iter()
        .map(|raw| parse_point(raw))
        .collect::<Result<Vec<_>, _>>()?;
    // The server would drop it and never acknowledge it.
    Stroke { points: points.clone(), color: args.color.clone(), width: args.width }.validate()?;

    let config = ClientConfig::from_env();
    let (input_tx, input_rx) = mpsc::channel(64);
    let (scene_tx, _scene_rx) = watch::channel(Scene::default());

    let url = args.url.clone();
    let client = tokio::spawn(async move { connection::run(&url, config, input_rx, scene_tx).await });

    let step = Duration::from_millis(args.step_ms);
    if send_gesture(&input_tx, points, args.color, args.width, step).await.is_err() {
        // The joined task below carries the reason.
        warn!("client ended before the gesture was fully sent");
    }
    drop(input_tx);

    let sender_id = tokio::time::timeout(Duration::from_secs(10), client)
        .await
        .map_err(|_| MainError::Timeout)???;
    info!(%sender_id, "stroke acknowledged");
    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<(), MainError> {
    let config = ClientConfig::from_env();
    // Held open for the whole run: a watcher never draws.
    let (_input_tx, input_rx) = mpsc::channel(1);
    let (scene_tx, mut scene_rx) = watch::channel(Scene::default());

    let url = args.url.clone();
    let mut client = tokio::spawn(async move { connection::run(&url, config, input_rx, scene_tx).await });

    loop {
        tokio::select! {
            result = &mut client => {
                result??;
                return Ok(());
            }
            changed = scene_rx.changed() => {
                if changed.is_err() {
                    (&mut client).await??;
                    return Ok(());
                }
                let scene = scene_rx.borrow_and_update().clone();
                info!(history = scene.history.len(), previews = scene.previews.len(), "canvas changed");
            }
            _ = tokio::signal::ctrl_c() => {
                client.abort();
                return Ok(());
            }
        }
    }
}

async fn send_gesture(
    tx: &mpsc::Sender<DrawInput>,
    points: Vec<Point>,
    color: String,
    width: f64,
    step: Duration,
) -> Result<(), SendError<DrawInput>> {
    let mut points = points.into_iter();
    let Some(first) = points.next() else {
        return Ok(());
    };
    tx.send(DrawInput::Begin { point: first, color, width }).await?;
    for point in points {
        tokio::time::sleep(step).await;
        tx.send(DrawInput::Extend(point)).await?;
    }
    tx.send(DrawInput::End).await
}

fn parse_point(raw: &str) -> Result<Point, MainError> {
    let invalid = || MainError::InvalidPoint(raw.to_owned());
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}

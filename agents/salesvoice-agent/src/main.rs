use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use salesvoice_agent::client::BackendClient;
use salesvoice_agent::events::{RoomEvent, participant_id_from_room};
use salesvoice_agent::worker::CallWorker;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// One worker per live call. Room events arrive as JSON lines on stdin
/// from the realtime transport bridge; transcripts stream to the backend
/// and the first termination trigger finalizes the session.
#[derive(Debug, Parser)]
#[command(name = "salesvoice-agent")]
struct Args {
    /// Backend API base URL.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    backend_url: String,

    /// Decorated room name for this call ({room}-user-{id}).
    #[arg(long)]
    room: String,

    /// Participant user id; defaults to the room-name suffix, then USER_ID.
    #[arg(long)]
    user_id: Option<String>,

    /// Identity the voice assistant itself joins the room with; its own
    /// disconnect must not trigger finalization.
    #[arg(long, default_value = "agent")]
    agent_identity: String,

    /// Caller phone number to record on the summary.
    #[arg(long)]
    phone_number: Option<String>,

    /// Outer deadline for a shutdown-triggered finalize, in seconds.
    #[arg(long, default_value_t = 25)]
    shutdown_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let participant_id = args
        .user_id
        .clone()
        .or_else(|| participant_id_from_room(&args.room).map(|s| s.to_string()))
        .or_else(|| std::env::var("USER_ID").ok())
        .unwrap_or_else(|| "anonymous-user".to_string());

    info!(room = %args.room, %participant_id, "Call worker starting");

    let worker = CallWorker::new(
        Arc::new(BackendClient::new(args.backend_url.clone())),
        args.room.clone(),
        participant_id,
        args.agent_identity.clone(),
        args.phone_number.clone(),
        Duration::from_secs(args.shutdown_timeout_secs),
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<RoomEvent>(line) {
                            Ok(event) => worker.handle(event).await,
                            Err(e) => warn!(error = %e, "Unparseable room event"),
                        }
                    }
                    // Bridge closed the pipe: the call is over.
                    Ok(None) => {
                        info!("Event stream ended");
                        worker.handle(RoomEvent::Shutdown).await;
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Event stream read failed");
                        worker.handle(RoomEvent::Shutdown).await;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                worker.handle(RoomEvent::Shutdown).await;
                break;
            }
        }

        if worker.guard().has_fired() {
            break;
        }
    }

    info!("Call worker exiting");
    Ok(())
}

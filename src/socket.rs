//! # Socket Gateway Consumer
//!
//! Keeps one websocket connection to the gateway, decodes its JSON frames
//! into the typed event vocabulary and forwards them to the event loop.
//! Join/leave subscriptions are replayed after a reconnect so a dropped
//! connection does not silently unsubscribe the bot.

use crate::events::GameEvent;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Subscription control messages keyed by game id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GatewayCommand {
    #[serde(rename_all = "camelCase")]
    JoinGame { game_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveGame { game_id: String },
}

type GatewaySink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type GatewaySource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

const BASE_RECONNECT_DELAY_SECS: u64 = 1;
const MAX_RECONNECT_DELAY_SECS: u64 = 30;
const RECONNECT_JITTER_MS: u64 = 500;

/// Run the gateway connection until the command channel closes.
pub async fn run_gateway(
    url: String,
    events: mpsc::Sender<GameEvent>,
    mut commands: mpsc::Receiver<GatewayCommand>,
) {
    let mut joined: HashSet<String> = HashSet::new();
    let mut delay_secs = BASE_RECONNECT_DELAY_SECS;

    loop {
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(err) => {
                let jitter = rand::thread_rng().gen_range(0..=RECONNECT_JITTER_MS);
                warn!(url = %url, error = %err, retry_in_secs = delay_secs, "Gateway connection failed");
                tokio::time::sleep(
                    Duration::from_secs(delay_secs) + Duration::from_millis(jitter),
                )
                .await;
                delay_secs = (delay_secs * 2).min(MAX_RECONNECT_DELAY_SECS);
                continue;
            }
        };
        info!(url = %url, "Connected to socket gateway");
        delay_secs = BASE_RECONNECT_DELAY_SECS;

        let (mut sink, mut source) = stream.split();

        // Replay subscriptions lost with the previous connection
        for game_id in &joined {
            let command = GatewayCommand::JoinGame {
                game_id: game_id.clone(),
            };
            if let Err(err) = send_command(&mut sink, &command).await {
                warn!(error = %err, game_id = %game_id, "Failed to replay subscription");
            }
        }

        if !pump(&mut sink, &mut source, &events, &mut commands, &mut joined).await {
            return;
        }
    }
}

/// Process frames and commands on one connection. Returns `false` when the
/// process is shutting down, `true` when the connection should be reopened.
async fn pump(
    sink: &mut GatewaySink,
    source: &mut GatewaySource,
    events: &mpsc::Sender<GameEvent>,
    commands: &mut mpsc::Receiver<GatewayCommand>,
    joined: &mut HashSet<String>,
) -> bool {
    loop {
        tokio::select! {
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(raw))) => match serde_json::from_str::<GameEvent>(&raw) {
                    Ok(GameEvent::Unknown) => {
                        debug!(frame = %raw, "Ignoring unknown gateway event");
                    }
                    Ok(event) => {
                        if events.send(event).await.is_err() {
                            info!("Event loop is gone, closing gateway connection");
                            return false;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, frame = %raw, "Discarding undecodable gateway frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Gateway connection closed");
                    return true;
                }
                // Ping/pong and binary frames carry no events
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    error!(error = %err, "Gateway read failed");
                    return true;
                }
            },
            command = commands.recv() => match command {
                Some(command) => {
                    match &command {
                        GatewayCommand::JoinGame { game_id } => {
                            joined.insert(game_id.clone());
                        }
                        GatewayCommand::LeaveGame { game_id } => {
                            joined.remove(game_id);
                        }
                    }
                    if let Err(err) = send_command(sink, &command).await {
                        warn!(error = %err, "Failed to send gateway command");
                        return true;
                    }
                }
                None => {
                    info!("Gateway command channel closed, shutting down");
                    return false;
                }
            },
        }
    }
}

async fn send_command(sink: &mut GatewaySink, command: &GatewayCommand) -> anyhow::Result<()> {
    let payload = serde_json::to_string(command)?;
    sink.send(Message::Text(payload)).await?;
    Ok(())
}

use anyhow::Context;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use game_client::{
    ChannelRelay, ClientConfig, ClientInput, GameClient, LocalAction, event_loop,
    transport::run_transport,
};
use game_core::{SessionEvent, SessionEventHandler};

struct LogHandler;

impl SessionEventHandler for LogHandler {
    fn handle_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::TimerTick { remaining, .. } if remaining % 10 != 0 => {}
            SessionEvent::GameOver { standings, .. } => {
                for standing in standings {
                    info!(
                        "#{} {} with {} points",
                        standing.rank, standing.username, standing.score
                    );
                }
            }
            event => info!("{:?}", event),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env().context("Invalid client configuration")?;
    info!(
        "Starting game client for {} ({}) in room {}",
        config.player_name, config.player_id, config.room_id
    );

    let (relay, outbound) = ChannelRelay::new();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    let mut client = GameClient::new(&config, relay)?;
    client.add_handler(Box::new(LogHandler));

    let transport = tokio::spawn(run_transport(
        config.relay_url.clone(),
        config.reconnect_delay,
        config.heartbeat_interval,
        outbound,
        inbound_tx.clone(),
    ));
    tokio::spawn(read_commands(inbound_tx));

    let client = event_loop::run(client, inbound_rx).await;
    info!(
        "Session ended in phase {} after round {}",
        client.session().phase(),
        client.session().round()
    );

    // Dropping the client closes the outbound queue, which ends the transport
    drop(client);
    match tokio::time::timeout(Duration::from_secs(2), transport).await {
        Ok(result) => result??,
        Err(_) => warn!("Relay transport did not shut down in time"),
    }
    Ok(())
}

/// Local UI stand-in: one command per line on stdin.
async fn read_commands(inbound: mpsc::UnboundedSender<ClientInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.split_whitespace();
        let action = match parts.next() {
            Some("start") => LocalAction::StartSession,
            Some("correct") => match parts.next().map(Uuid::parse_str) {
                Some(Ok(guesser)) => LocalAction::ReportCorrectAnswer { guesser },
                _ => {
                    warn!("Usage: correct <player-id>");
                    continue;
                }
            },
            Some("words") => LocalAction::SetupPlayer {
                assigned_words: parts.map(str::to_string).collect(),
                notes: String::new(),
            },
            Some("ready") => LocalAction::RoundReady,
            Some("leave") | Some("quit") => LocalAction::Leave,
            Some(other) => {
                warn!("Unknown command {:?}", other);
                continue;
            }
            None => continue,
        };

        if inbound.send(ClientInput::Local(action)).is_err() {
            break;
        }
    }
}

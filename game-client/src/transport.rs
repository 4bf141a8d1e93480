use futures_util::{SinkExt, StreamExt};
use game_types::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::ClientInput;

enum Outcome {
    /// The socket dropped; try again after the reconnect delay.
    Lost,
    /// The client side went away; nothing left to carry.
    Finished,
}

/// Moves messages between the relay websocket and the client queues,
/// reconnecting after `reconnect_delay` whenever the socket drops. A ping
/// goes out every `heartbeat` so the relay sees a quiet player as live.
pub async fn run_transport(
    url: String,
    reconnect_delay: Duration,
    heartbeat: Duration,
    mut outbound: mpsc::UnboundedReceiver<ClientMessage>,
    inbound: mpsc::UnboundedSender<ClientInput>,
) -> anyhow::Result<()> {
    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                info!("Connected to relay at {}", url);
                if !discard_queued(&mut outbound) || inbound.send(ClientInput::RelayConnected).is_err()
                {
                    return Ok(());
                }

                let (mut sink, mut source) = stream.split();
                let mut pings = tokio::time::interval_at(
                    tokio::time::Instant::now() + heartbeat,
                    heartbeat,
                );
                let outcome = loop {
                    tokio::select! {
                        _ = pings.tick() => {
                            if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                                warn!("Failed to ping relay: {}", e);
                                break Outcome::Lost;
                            }
                        }
                        message = outbound.recv() => match message {
                            Some(message) => {
                                let json = serde_json::to_string(&message)?;
                                if let Err(e) = sink.send(Message::Text(json)).await {
                                    warn!("Failed to send {} to relay: {}", message.name(), e);
                                    break Outcome::Lost;
                                }
                            }
                            None => {
                                let _ = sink.close().await;
                                break Outcome::Finished;
                            }
                        },
                        frame = source.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<ServerMessage>(&text) {
                                    Ok(message) => {
                                        if inbound.send(ClientInput::Relay(message)).is_err() {
                                            break Outcome::Finished;
                                        }
                                    }
                                    Err(e) => warn!("Discarding malformed relay message: {}", e),
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break Outcome::Lost,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Relay websocket error: {}", e);
                                break Outcome::Lost;
                            }
                        },
                    }
                };

                match outcome {
                    Outcome::Finished => return Ok(()),
                    Outcome::Lost => {
                        if inbound.send(ClientInput::RelayDisconnected).is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            Err(e) => warn!("Could not reach relay at {}: {}", url, e),
        }

        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Drop anything emitted while the relay was away; the client resyncs from a
/// fresh snapshot instead. Returns false once the client side has gone.
fn discard_queued(outbound: &mut mpsc::UnboundedReceiver<ClientMessage>) -> bool {
    loop {
        match outbound.try_recv() {
            Ok(message) => debug!("Dropping {} queued while disconnected", message.name()),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::config::Config;
use crate::rooms::RoomRegistry;
use game_types::{ClientMessage, RelayErrorKind, ServerMessage};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    rooms: Arc<RoomRegistry>,
    config: Arc<Config>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let mut rate_limiter = RateLimiter::new(config.rate_limit_burst, config.rate_limit_refill);

    let message_receiver = connection_manager.create_connection(connection_id).await;
    let message_handler = MessageHandler::new(connection_id, connection_manager.clone(), rooms);

    let incoming_handler = {
        let message_handler = message_handler.clone();
        let connection_manager = connection_manager.clone();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) if msg.is_close() => break,
                    Ok(msg) => {
                        // Any frame, pings included, shows the peer is alive
                        connection_manager.update_activity(connection_id).await;
                        if let Err(error) =
                            handle_message(msg, &mut rate_limiter, &message_handler).await
                        {
                            warn!("Rejected message from {}: {}", connection_id, error);
                            if connection_manager
                                .send_to_connection(connection_id, ServerMessage::Error { error })
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                return;
            }
        }

        // The manager dropped this connection: evicted or replaced
        info!("Closing socket for {}", connection_id);
        let _ = ws_sender.send(Message::close()).await;
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!("Connection {} disconnected", connection_id);
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;
}

/// Rejections come back as the error to report to the sender. The socket
/// stays open for all of them.
async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
) -> Result<(), RelayErrorKind> {
    // Pings and binary frames carry nothing for us
    let Ok(text) = msg.to_str() else {
        return Ok(());
    };

    if !rate_limiter.check_rate_limit() {
        return Err(RelayErrorKind::RateLimitExceeded);
    }

    let client_message: ClientMessage =
        serde_json::from_str(text).map_err(|e| RelayErrorKind::InvalidMessage {
            reason: e.to_string(),
        })?;

    if let Err(e) = message_handler.handle_message(client_message).await {
        // Only fails when our own outbound channel is gone
        warn!("Could not answer message: {}", e);
    }
    Ok(())
}

/// Drop sockets that have gone quiet, announcing their departure like a
/// normal disconnect. Removing the connection closes its socket.
pub async fn sweep_inactive(
    connection_manager: &ConnectionManager,
    rooms: &RoomRegistry,
    timeout: Duration,
) -> usize {
    let stale = connection_manager.inactive_connections(timeout).await;
    for connection_id in &stale {
        info!("Removing inactive connection {}", connection_id);
        if let Some(seat) = connection_manager.seat_of(*connection_id).await {
            handlers::release_seat(connection_manager, rooms, *connection_id, seat).await;
        }
        connection_manager.remove_connection(*connection_id).await;
    }
    stale.len()
}

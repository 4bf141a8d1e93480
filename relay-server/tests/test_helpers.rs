#![allow(dead_code)]

use game_types::{Player, ServerMessage};
use relay_server::rooms::RoomRegistry;
use relay_server::websocket::connection::{ConnectionId, ConnectionManager};
use relay_server::websocket::handlers::MessageHandler;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

pub fn create_test_player(name: &str) -> Player {
    Player::new(Uuid::new_v4(), name, format!("avatars/{}", name.to_lowercase()))
}

/// A connection registered with the relay, with the receiving end of its
/// outbound channel standing in for the socket
pub struct TestConnection {
    pub id: ConnectionId,
    pub handler: MessageHandler,
    pub inbox: mpsc::UnboundedReceiver<ServerMessage>,
}

impl TestConnection {
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.inbox.try_recv() {
            messages.push(message);
        }
        messages
    }

    pub fn drain_names(&mut self) -> Vec<&'static str> {
        self.drain().iter().map(|m| m.name()).collect()
    }

    /// The relay dropped this connection, which closes its socket
    pub fn is_closed(&mut self) -> bool {
        matches!(self.inbox.try_recv(), Err(TryRecvError::Disconnected))
    }
}

pub struct TestRelaySetup {
    pub connection_manager: Arc<ConnectionManager>,
    pub rooms: Arc<RoomRegistry>,
}

impl TestRelaySetup {
    pub fn new() -> Self {
        Self {
            connection_manager: Arc::new(ConnectionManager::new()),
            rooms: Arc::new(RoomRegistry::new()),
        }
    }

    pub async fn connect(&self) -> TestConnection {
        let id = ConnectionId::new();
        let inbox = self.connection_manager.create_connection(id).await;
        TestConnection {
            id,
            handler: MessageHandler::new(id, self.connection_manager.clone(), self.rooms.clone()),
            inbox,
        }
    }

    /// Connect and seat each named player in `room_id`, with inboxes drained
    pub async fn seat_players(
        &self,
        room_id: &str,
        names: &[&str],
    ) -> Vec<(TestConnection, Player)> {
        let mut seated = Vec::new();
        for name in names {
            let connection = self.connect().await;
            let player = create_test_player(name);
            connection
                .handler
                .handle_message(game_types::ClientMessage::JoinRoom {
                    room_id: room_id.to_string(),
                    player: player.clone(),
                })
                .await
                .unwrap();
            seated.push((connection, player));
        }
        for (connection, _) in seated.iter_mut() {
            connection.drain();
        }
        seated
    }
}

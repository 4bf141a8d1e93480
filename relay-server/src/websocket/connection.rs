use game_types::{PlayerId, RoomId, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a socket is seated as, once it has joined a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub player_id: PlayerId,
    pub room_id: RoomId,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub seat: Option<Seat>,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            seat: None,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn in_room(&self, room_id: &str) -> bool {
        self.seat.as_ref().is_some_and(|seat| seat.room_id == room_id)
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        let mut connections = self.connections.write().await;
        connections.insert(id, conn);

        receiver
    }

    /// Returns the removed connection so the caller can release its seat.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.write().await;
        connections.remove(&id)
    }

    /// The connection currently seated as `player_id` in `room_id`.
    pub async fn seat_holder(&self, room_id: &str, player_id: &PlayerId) -> Option<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .find(|conn| {
                conn.seat
                    .as_ref()
                    .is_some_and(|seat| seat.room_id == room_id && seat.player_id == *player_id)
            })
            .map(|conn| conn.id)
    }

    pub async fn seat_of(&self, id: ConnectionId) -> Option<Seat> {
        let connections = self.connections.read().await;
        connections.get(&id).and_then(|conn| conn.seat.clone())
    }

    pub async fn set_seat(&self, id: ConnectionId, seat: Option<Seat>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.seat = seat;
        }
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_room(&self, room_id: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values().filter(|conn| conn.in_room(room_id)) {
            let _ = connection.send_message(message.clone());
        }
    }

    pub async fn send_to_room_except(
        &self,
        room_id: &str,
        except_connection: ConnectionId,
        message: ServerMessage,
    ) {
        let connections = self.connections.read().await;
        for connection in connections
            .values()
            .filter(|conn| conn.id != except_connection && conn.in_room(room_id))
        {
            let _ = connection.send_message(message.clone());
        }
    }

    pub async fn inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.is_inactive(timeout))
            .map(|conn| conn.id)
            .collect()
    }

    pub async fn get_connections_in_room(&self, room_id: &str) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.in_room(room_id))
            .map(|conn| conn.id)
            .collect()
    }

    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

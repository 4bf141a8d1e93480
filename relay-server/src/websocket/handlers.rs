use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::rooms::RoomRegistry;
use crate::websocket::connection::{ConnectionId, ConnectionManager, Seat};
use game_types::{
    ClientMessage, Player, PlayerId, PlayerLeftPayload, RelayErrorKind, RoomId, ServerMessage,
};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    rooms: Arc<RoomRegistry>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        rooms: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            rooms,
        }
    }

    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        debug!("{} from connection {}", message.name(), self.connection_id);
        match message {
            ClientMessage::JoinRoom { room_id, player } => {
                self.handle_join_room(room_id, player).await
            }
            ClientMessage::UpdatePlayer { player } => self.handle_update_player(player).await,
            ClientMessage::RequestSnapshot => self.handle_request_snapshot().await,
            ClientMessage::QuitGame { player, room_id } => {
                self.handle_quit_game(player, room_id).await
            }
            other => self.handle_turn_event(other).await,
        }
    }

    /// Release the seat held by this socket, if any.
    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);

        if let Some(seat) = self.connection_manager.seat_of(self.connection_id).await {
            release_seat(&self.connection_manager, &self.rooms, self.connection_id, seat).await;
        }
    }

    async fn handle_join_room(&self, room_id: RoomId, player: Player) -> Result<(), String> {
        if let Some(seat) = self.connection_manager.seat_of(self.connection_id).await {
            if seat.room_id == room_id && seat.player_id == player.id {
                // Reconnect handshake on a socket that is already seated
                return self.send_snapshot(&room_id).await;
            }
            return self
                .send_error(RelayErrorKind::AlreadySeated {
                    player_id: seat.player_id,
                })
                .await;
        }

        let player_id = player.id;
        match self.rooms.join(&room_id, player).await {
            Ok(roster) => {
                self.connection_manager
                    .set_seat(
                        self.connection_id,
                        Some(Seat {
                            player_id,
                            room_id: room_id.clone(),
                        }),
                    )
                    .await;
                self.connection_manager
                    .send_to_room(&room_id, ServerMessage::PlayerChange(roster))
                    .await;
                Ok(())
            }
            Err(RelayErrorKind::AlreadySeated { player_id: seated })
                if seated == player_id =>
            {
                if self.take_over_seat(&room_id, player_id).await {
                    return self.send_snapshot(&room_id).await;
                }
                warn!(
                    "Player {} is seated in room {} with no socket to take over",
                    player_id, room_id
                );
                self.send_error(RelayErrorKind::AlreadySeated { player_id }).await
            }
            Err(error) => {
                warn!(
                    "Connection {} could not join room {}: {}",
                    self.connection_id, room_id, error
                );
                self.send_error(error).await
            }
        }
    }

    /// Move a seat from the player's previous socket to this one. The old
    /// socket is dropped without a departure, so the room sees no change.
    async fn take_over_seat(&self, room_id: &str, player_id: PlayerId) -> bool {
        let Some(previous) = self.connection_manager.seat_holder(room_id, &player_id).await else {
            return false;
        };
        if previous == self.connection_id {
            return false;
        }

        info!(
            "Player {} reconnected on {}, closing {}",
            player_id, self.connection_id, previous
        );
        self.connection_manager.set_seat(previous, None).await;
        self.connection_manager.remove_connection(previous).await;
        self.connection_manager
            .set_seat(
                self.connection_id,
                Some(Seat {
                    player_id,
                    room_id: room_id.to_string(),
                }),
            )
            .await;
        true
    }

    async fn handle_update_player(&self, player: Player) -> Result<(), String> {
        let Some(seat) = self.connection_manager.seat_of(self.connection_id).await else {
            return self.send_error(RelayErrorKind::NotInRoom).await;
        };
        if seat.player_id != player.id {
            warn!(
                "Connection {} tried to update player {} while seated as {}",
                self.connection_id, player.id, seat.player_id
            );
            return self.send_error(RelayErrorKind::NotInRoom).await;
        }

        match self.rooms.update_player(&seat.room_id, &player).await {
            Ok(roster) => {
                self.connection_manager
                    .send_to_room(&seat.room_id, ServerMessage::PlayerChange(roster))
                    .await;
                Ok(())
            }
            Err(error) => self.send_error(error).await,
        }
    }

    async fn handle_request_snapshot(&self) -> Result<(), String> {
        let Some(seat) = self.connection_manager.seat_of(self.connection_id).await else {
            return self.send_error(RelayErrorKind::NotInRoom).await;
        };
        self.send_snapshot(&seat.room_id).await
    }

    async fn handle_quit_game(&self, player_id: PlayerId, room_id: RoomId) -> Result<(), String> {
        let seat = self.connection_manager.seat_of(self.connection_id).await;
        match seat {
            Some(seat) if seat.player_id == player_id && seat.room_id == room_id => {
                release_seat(&self.connection_manager, &self.rooms, self.connection_id, seat)
                    .await;
                Ok(())
            }
            // Already released, or never seated: nothing to announce
            None => Ok(()),
            Some(_) => self.send_error(RelayErrorKind::NotInRoom).await,
        }
    }

    async fn handle_turn_event(&self, message: ClientMessage) -> Result<(), String> {
        let Some(seat) = self.connection_manager.seat_of(self.connection_id).await else {
            return self.send_error(RelayErrorKind::NotInRoom).await;
        };

        match &message {
            ClientMessage::CorrectAnswer(payload) => {
                let scored = self
                    .rooms
                    .record_correct_answer(&seat.room_id, payload.turn, &payload.guesser)
                    .await;
                if !scored {
                    debug!(
                        "Dropping correct answer for {} from {}, already claimed",
                        payload.turn, self.connection_id
                    );
                    return Ok(());
                }
            }
            ClientMessage::GameOver(payload) => {
                self.rooms.merge(&seat.room_id, &payload.players).await;
            }
            _ => {}
        }

        if let Some(outgoing) = message.into_broadcast() {
            self.connection_manager
                .send_to_room_except(&seat.room_id, self.connection_id, outgoing)
                .await;
        }
        Ok(())
    }

    async fn send_snapshot(&self, room_id: &str) -> Result<(), String> {
        match self.rooms.snapshot(room_id).await {
            Some(roster) => self.send_message(ServerMessage::PlayerChange(roster)).await,
            None => {
                self.send_error(RelayErrorKind::RoomNotFound {
                    room_id: room_id.to_string(),
                })
                .await
            }
        }
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_error(&self, error: RelayErrorKind) -> Result<(), String> {
        self.send_message(ServerMessage::Error { error }).await
    }
}

/// Unseat a connection and tell the rest of its room. Safe to call more than
/// once for the same seat; only the first call announces anything.
pub async fn release_seat(
    connection_manager: &ConnectionManager,
    rooms: &RoomRegistry,
    connection_id: ConnectionId,
    seat: Seat,
) {
    connection_manager.set_seat(connection_id, None).await;

    let Some(remaining) = rooms.leave(&seat.room_id, &seat.player_id).await else {
        return;
    };

    info!(
        "Player {} left room {}, {} remaining",
        seat.player_id,
        seat.room_id,
        remaining.len()
    );
    connection_manager
        .send_to_room(
            &seat.room_id,
            ServerMessage::PlayerLeft(PlayerLeftPayload {
                player_id: seat.player_id,
                next_describer_order: None,
                next_round: None,
                remaining_players: remaining,
            }),
        )
        .await;
}

use game_core::{PlayerRegistry, SyncError};
use game_types::{Player, PlayerId, PlayerMap, RelayErrorKind, RoomId, TurnKey};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Room {
    roster: PlayerRegistry,
    /// Turns that already paid out a correct answer.
    scored: HashSet<TurnKey>,
}

/// Rosters for every live room. A room exists while at least one player is
/// seated in it.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Seat a player at the room's next free seat, creating the room if needed.
    pub async fn join(&self, room_id: &str, player: Player) -> Result<PlayerMap, RelayErrorKind> {
        let mut rooms = self.rooms.write().await;
        let roster = &mut rooms.entry(room_id.to_string()).or_default().roster;

        let player_id = player.id;
        match roster.join(player) {
            Ok(order) => {
                info!("Player {} seated at {} in room {}", player_id, order, room_id);
                Ok(roster.snapshot())
            }
            Err(SyncError::DuplicatePlayer { player_id }) => {
                Err(RelayErrorKind::AlreadySeated { player_id })
            }
            Err(e) => Err(RelayErrorKind::InvalidMessage {
                reason: e.to_string(),
            }),
        }
    }

    pub async fn update_player(
        &self,
        room_id: &str,
        player: &Player,
    ) -> Result<PlayerMap, RelayErrorKind> {
        let mut rooms = self.rooms.write().await;
        let roster = &mut rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayErrorKind::RoomNotFound {
                room_id: room_id.to_string(),
            })?
            .roster;

        roster
            .update_details(player)
            .map_err(|_| RelayErrorKind::NotInRoom)?;
        Ok(roster.snapshot())
    }

    /// Remove a player and return who is left. `None` if the player was not
    /// seated, so repeated leaves are harmless. Empty rooms are dropped.
    pub async fn leave(&self, room_id: &str, player_id: &PlayerId) -> Option<PlayerMap> {
        let mut rooms = self.rooms.write().await;
        let roster = &mut rooms.get_mut(room_id)?.roster;
        let departure = roster.remove(player_id).ok()?;
        let remaining = roster.snapshot();

        debug!(
            "Player {} left seat {} of room {}",
            departure.player.id, departure.old_order, room_id
        );
        if remaining.is_empty() {
            rooms.remove(room_id);
            info!("Room {} is empty, dropping it", room_id);
        }
        Some(remaining)
    }

    /// Fold relayed scores and words into the cached roster.
    pub async fn merge(&self, room_id: &str, players: &PlayerMap) {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get_mut(room_id) {
            room.roster.merge(players);
        }
    }

    /// Award `guesser` the point for `turn` if nobody has claimed it yet.
    /// Returns false for a repeat claim, a describer guessing their own word
    /// or a guesser who is not seated.
    pub async fn record_correct_answer(
        &self,
        room_id: &str,
        turn: TurnKey,
        guesser: &PlayerId,
    ) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };
        if turn.describer == *guesser || room.scored.contains(&turn) {
            debug!("Not scoring {} for {} in room {}", guesser, turn, room_id);
            return false;
        }
        match room.roster.award_point(guesser) {
            Ok(score) => {
                room.scored.insert(turn);
                info!("Player {} scored {} in room {}, now {}", guesser, turn, room_id, score);
                true
            }
            Err(e) => {
                warn!("Ignoring correct answer in room {}: {}", room_id, e);
                false
            }
        }
    }

    pub async fn snapshot(&self, room_id: &str) -> Option<PlayerMap> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map(|room| room.roster.snapshot())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn player_count(&self, room_id: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map_or(0, |room| room.roster.len())
    }
}

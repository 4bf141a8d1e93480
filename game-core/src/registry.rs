use game_types::{Player, PlayerId, PlayerMap};
use std::collections::HashSet;

use crate::SyncError;

/// A player that was just removed, with the seat it held before renumbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    pub old_order: usize,
}

/// Ordered set of seated players. Seats always form exactly `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRegistry {
    players: PlayerMap,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a relayed mapping, rejecting anything that is not
    /// a dense seating keyed by the players' own ids.
    pub fn from_snapshot(players: PlayerMap) -> Result<Self, SyncError> {
        let seated = players.len();
        let mut seen = vec![false; seated];

        for (id, player) in &players {
            if *id != player.id {
                return Err(SyncError::UnknownPlayer { player_id: *id });
            }
            if player.order >= seated {
                return Err(SyncError::NoSuchSeat {
                    order: player.order,
                    seated,
                });
            }
            if seen[player.order] {
                return Err(SyncError::DuplicateSeat {
                    order: player.order,
                });
            }
            seen[player.order] = true;
        }

        Ok(Self { players })
    }

    /// Seat a player at `player.order`.
    pub fn add(&mut self, player: Player) -> Result<usize, SyncError> {
        if self.players.contains_key(&player.id) {
            return Err(SyncError::DuplicatePlayer {
                player_id: player.id,
            });
        }

        let seated = self.players.len();
        if player.order < seated {
            return Err(SyncError::DuplicateSeat {
                order: player.order,
            });
        }
        if player.order > seated {
            // Would leave a gap in the seating
            return Err(SyncError::NoSuchSeat {
                order: player.order,
                seated,
            });
        }

        let order = player.order;
        self.players.insert(player.id, player);
        Ok(order)
    }

    /// Seat a player at the next free seat.
    pub fn join(&mut self, mut player: Player) -> Result<usize, SyncError> {
        player.order = self.players.len();
        self.add(player)
    }

    pub fn remove(&mut self, player_id: &PlayerId) -> Result<Departure, SyncError> {
        let player = self
            .players
            .remove(player_id)
            .ok_or(SyncError::UnknownPlayer {
                player_id: *player_id,
            })?;

        let old_order = player.order;
        for remaining in self.players.values_mut() {
            if remaining.order > old_order {
                remaining.order -= 1;
            }
        }

        Ok(Departure { player, old_order })
    }

    pub fn by_order(&self, order: usize) -> Result<&Player, SyncError> {
        self.players
            .values()
            .find(|p| p.order == order)
            .ok_or(SyncError::NoSuchSeat {
                order,
                seated: self.players.len(),
            })
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players sorted by seat.
    pub fn ordered(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.order);
        players
    }

    pub fn snapshot(&self) -> PlayerMap {
        self.players.clone()
    }

    /// Adopt score, words, notes and avatar from a relayed mapping for players
    /// that are seated here. Seats are never taken from the mapping.
    pub fn merge(&mut self, players: &PlayerMap) {
        for (id, incoming) in players {
            if let Some(player) = self.players.get_mut(id) {
                player.score = incoming.score;
                player.assigned_words = incoming.assigned_words.clone();
                player.notes = incoming.notes.clone();
                player.avatar_ref = incoming.avatar_ref.clone();
            }
        }
    }

    /// Replace a seated player's words, notes and avatar. Seat and score stay.
    pub fn update_details(&mut self, player: &Player) -> Result<&Player, SyncError> {
        let seated = self
            .players
            .get_mut(&player.id)
            .ok_or(SyncError::UnknownPlayer {
                player_id: player.id,
            })?;
        seated.assigned_words = player.assigned_words.clone();
        seated.notes = player.notes.clone();
        seated.avatar_ref = player.avatar_ref.clone();
        Ok(seated)
    }

    /// One point for a correct guess. Returns the new score.
    pub fn award_point(&mut self, player_id: &PlayerId) -> Result<u32, SyncError> {
        let player = self
            .players
            .get_mut(player_id)
            .ok_or(SyncError::UnknownPlayer {
                player_id: *player_id,
            })?;
        player.score += 1;
        Ok(player.score)
    }

    pub fn same_members(&self, players: &PlayerMap) -> bool {
        let ours: HashSet<&PlayerId> = self.players.keys().collect();
        let theirs: HashSet<&PlayerId> = players.keys().collect();
        ours == theirs
    }

    pub fn is_dense(&self) -> bool {
        let mut orders: Vec<usize> = self.players.values().map(|p| p.order).collect();
        orders.sort_unstable();
        orders.iter().enumerate().all(|(i, order)| i == *order)
    }
}

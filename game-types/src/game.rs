use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Phase {
    Lobby,           // Seats filling, no turn yet
    InTurn,          // A describer is active
    RoundTransition, // Waiting for next round's word assignments
    GameOver,        // Terminal
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::InTurn => "in-turn",
            Phase::RoundTransition => "round-transition",
            Phase::GameOver => "game-over",
        };
        f.write_str(name)
    }
}

/// Identity of a single turn. A player describes at most once per round, so
/// the pair is unique for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TurnKey {
    pub round: u32,
    pub describer: PlayerId,
}

impl TurnKey {
    pub fn new(round: u32, describer: PlayerId) -> Self {
        Self { round, describer }
    }
}

impl fmt::Display for TurnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {} / describer {}", self.round, self.describer)
    }
}

/// Final placement of a player once the game is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Standing {
    pub player_id: PlayerId,
    pub username: String,
    pub score: u32,
    pub order: usize,
    /// 1-based position, best first.
    pub rank: u32,
}

use game_types::{Phase, PlayerId, TurnKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("seat {order} is already taken")]
    DuplicateSeat { order: usize },
    #[error("no seat {order} among {seated} seated players")]
    NoSuchSeat { order: usize, seated: usize },
    #[error("player {player_id} is already seated")]
    DuplicatePlayer { player_id: PlayerId },
    #[error("player {player_id} is not seated")]
    UnknownPlayer { player_id: PlayerId },
    #[error("cannot apply {signal} while in {phase}")]
    InvalidTransition { phase: Phase, signal: &'static str },
    #[error("round limit must be at least 1")]
    InvalidRoundLimit,
}

impl SyncError {
    /// Registry invariant violations point at a relay or desync bug and are
    /// answered with a full snapshot request.
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            SyncError::DuplicateSeat { .. }
                | SyncError::NoSuchSeat { .. }
                | SyncError::DuplicatePlayer { .. }
                | SyncError::UnknownPlayer { .. }
        )
    }
}

/// Raised by the watchdog when a turn started but no timer was ever observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no timer announcement observed for {turn}")]
pub struct MissingAuthorityTimer {
    pub turn: TurnKey,
}

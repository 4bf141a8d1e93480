use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::PlayerId;

/// Rejections the relay reports back to the sending connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RelayErrorKind {
    NotInRoom,
    RoomNotFound { room_id: String },
    AlreadySeated { player_id: PlayerId },
    InvalidMessage { reason: String },
    RateLimitExceeded,
}

impl fmt::Display for RelayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayErrorKind::NotInRoom => write!(f, "connection has not joined a room"),
            RelayErrorKind::RoomNotFound { room_id } => write!(f, "room {} not found", room_id),
            RelayErrorKind::AlreadySeated { player_id } => {
                write!(f, "player {} is already seated", player_id)
            }
            RelayErrorKind::InvalidMessage { reason } => write!(f, "invalid message: {}", reason),
            RelayErrorKind::RateLimitExceeded => write!(f, "rate limit exceeded"),
        }
    }
}

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Player, PlayerId, PlayerMap, RelayErrorKind, RoomId, TurnKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StartRoundPayload {
    /// Seconds on the clock when the announcement was made.
    pub duration: u32,
    pub turn: TurnKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CorrectAnswerPayload {
    /// The sender's view of the scores after the point. Informational only;
    /// receivers score `guesser` themselves.
    pub players: PlayerMap,
    pub turn: TurnKey,
    pub guesser: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TurnUpdatedPayload {
    /// The turn that just ended.
    pub ended: TurnKey,
    pub next_describer_order: usize,
    pub next_round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerLeftPayload {
    pub player_id: PlayerId,
    pub next_describer_order: Option<usize>,
    pub next_round: Option<u32>,
    pub remaining_players: PlayerMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameOverPayload {
    pub players: PlayerMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimeUpdatePayload {
    pub remaining: u32,
    pub turn: TurnKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TimerResyncPayload {
    pub turn: TurnKey,
}

/// Messages a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
#[ts(export)]
pub enum ClientMessage {
    JoinRoom { room_id: RoomId, player: Player },
    UpdatePlayer { player: Player },
    StartRound(StartRoundPayload),
    CorrectAnswer(CorrectAnswerPayload),
    TurnUpdated(TurnUpdatedPayload),
    GameOver(GameOverPayload),
    TimeUpdate(TimeUpdatePayload),
    RequestTimerResync(TimerResyncPayload),
    RequestSnapshot,
    QuitGame { player: PlayerId, room_id: RoomId },
}

/// Messages the relay delivers to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
#[ts(export)]
pub enum ServerMessage {
    PlayerChange(PlayerMap),
    StartRound(StartRoundPayload),
    CorrectAnswer(CorrectAnswerPayload),
    TurnUpdated(TurnUpdatedPayload),
    PlayerLeft(PlayerLeftPayload),
    GameOver(GameOverPayload),
    TimeUpdate(TimeUpdatePayload),
    RequestTimerResync(TimerResyncPayload),
    Error { error: RelayErrorKind },
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom { .. } => "join-room",
            ClientMessage::UpdatePlayer { .. } => "update-player",
            ClientMessage::StartRound(_) => "start-round",
            ClientMessage::CorrectAnswer(_) => "correct-answer",
            ClientMessage::TurnUpdated(_) => "turn-updated",
            ClientMessage::GameOver(_) => "game-over",
            ClientMessage::TimeUpdate(_) => "time-update",
            ClientMessage::RequestTimerResync(_) => "request-timer-resync",
            ClientMessage::RequestSnapshot => "request-snapshot",
            ClientMessage::QuitGame { .. } => "quit-game",
        }
    }

    /// The message other room members receive when the relay simply fans this
    /// one out. Membership messages return `None`; the relay handles them.
    pub fn into_broadcast(self) -> Option<ServerMessage> {
        match self {
            ClientMessage::StartRound(payload) => Some(ServerMessage::StartRound(payload)),
            ClientMessage::CorrectAnswer(payload) => Some(ServerMessage::CorrectAnswer(payload)),
            ClientMessage::TurnUpdated(payload) => Some(ServerMessage::TurnUpdated(payload)),
            ClientMessage::GameOver(payload) => Some(ServerMessage::GameOver(payload)),
            ClientMessage::TimeUpdate(payload) => Some(ServerMessage::TimeUpdate(payload)),
            ClientMessage::RequestTimerResync(payload) => {
                Some(ServerMessage::RequestTimerResync(payload))
            }
            ClientMessage::JoinRoom { .. }
            | ClientMessage::UpdatePlayer { .. }
            | ClientMessage::RequestSnapshot
            | ClientMessage::QuitGame { .. } => None,
        }
    }
}

impl ServerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::PlayerChange(_) => "player-change",
            ServerMessage::StartRound(_) => "start-round",
            ServerMessage::CorrectAnswer(_) => "correct-answer",
            ServerMessage::TurnUpdated(_) => "turn-updated",
            ServerMessage::PlayerLeft(_) => "player-left",
            ServerMessage::GameOver(_) => "game-over",
            ServerMessage::TimeUpdate(_) => "time-update",
            ServerMessage::RequestTimerResync(_) => "request-timer-resync",
            ServerMessage::Error { .. } => "error",
        }
    }
}

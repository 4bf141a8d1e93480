use game_types::{PlayerId, ServerMessage};

/// Everything the event loop reacts to. Each kind has exactly one handler in
/// [`crate::GameClient::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientInput {
    Local(LocalAction),
    Relay(ServerMessage),
    /// One second of local time passed.
    Tick,
    RelayConnected,
    RelayDisconnected,
}

/// Actions raised by the local player or the local round-setup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    StartSession,
    /// `guesser` named the current word.
    ReportCorrectAnswer { guesser: PlayerId },
    /// Publish this round's words and notes for the local player.
    SetupPlayer {
        assigned_words: Vec<String>,
        notes: String,
    },
    RoundReady,
    Leave,
}

impl ClientInput {
    pub fn name(&self) -> &'static str {
        match self {
            ClientInput::Local(action) => action.name(),
            ClientInput::Relay(message) => message.name(),
            ClientInput::Tick => "tick",
            ClientInput::RelayConnected => "relay-connected",
            ClientInput::RelayDisconnected => "relay-disconnected",
        }
    }
}

impl LocalAction {
    pub fn name(&self) -> &'static str {
        match self {
            LocalAction::StartSession => "start-session",
            LocalAction::ReportCorrectAnswer { .. } => "report-correct-answer",
            LocalAction::SetupPlayer { .. } => "setup-player",
            LocalAction::RoundReady => "round-ready",
            LocalAction::Leave => "leave",
        }
    }
}

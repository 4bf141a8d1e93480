use game_types::{PlayerId, RoomId, Standing, TurnKey};

/// What a client observed happening to its session. Rendering code consumes
/// these; it never reads the relay directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TurnStarted {
        room_id: RoomId,
        turn: TurnKey,
        describer_name: String,
    },
    TimerTick {
        turn: TurnKey,
        remaining: u32,
    },
    RoundEnded {
        room_id: RoomId,
        next_round: u32,
    },
    PlayerLeft {
        room_id: RoomId,
        player_id: PlayerId,
    },
    GameOver {
        room_id: RoomId,
        standings: Vec<Standing>,
    },
    Desync {
        room_id: RoomId,
        reason: String,
    },
    RelayLost {
        room_id: RoomId,
    },
    RelayRestored {
        room_id: RoomId,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::TurnStarted { .. } => "turn-started",
            SessionEvent::TimerTick { .. } => "timer-tick",
            SessionEvent::RoundEnded { .. } => "round-ended",
            SessionEvent::PlayerLeft { .. } => "player-left",
            SessionEvent::GameOver { .. } => "game-over",
            SessionEvent::Desync { .. } => "desync",
            SessionEvent::RelayLost { .. } => "relay-lost",
            SessionEvent::RelayRestored { .. } => "relay-restored",
        }
    }
}

/// Event handler trait for processing session events
pub trait SessionEventHandler: Send {
    fn handle_event(&mut self, event: &SessionEvent);
}

/// Simple event bus for distributing session events
#[derive(Default)]
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: SessionEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(&event);
        }
    }
}

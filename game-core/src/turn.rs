use chrono::{DateTime, Utc};
use game_types::{Phase, Player, PlayerId, PlayerMap, RoomId, TurnKey, TurnUpdatedPayload};
use std::fmt;
use tracing::{debug, info, warn};

use crate::{PlayerRegistry, SyncError, TimerSynchronizer};

/// One client's view of the game. Owned by the client that displays it and
/// only ever changed through [`TurnCoordinator::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    room_id: RoomId,
    registry: PlayerRegistry,
    round: u32,
    describer_order: usize,
    phase: Phase,
}

impl Session {
    pub fn new(room_id: impl Into<RoomId>, registry: PlayerRegistry) -> Self {
        Self {
            room_id: room_id.into(),
            registry,
            round: 0,
            describer_order: 0,
            phase: Phase::Lobby,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn describer_order(&self) -> usize {
        self.describer_order
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player_count(&self) -> usize {
        self.registry.len()
    }

    /// `(round, describer_order)`
    pub fn position(&self) -> (u32, usize) {
        (self.round, self.describer_order)
    }

    pub fn describer(&self) -> Option<&Player> {
        if self.phase != Phase::InTurn {
            return None;
        }
        self.registry.by_order(self.describer_order).ok()
    }

    pub fn current_turn(&self) -> Option<TurnKey> {
        self.describer().map(|p| TurnKey::new(self.round, p.id))
    }

    pub fn turn(&self, timer: &TimerSynchronizer) -> Option<Turn> {
        let describer = self.describer()?;
        let key = TurnKey::new(self.round, describer.id);
        let timed = timer.turn() == Some(key);

        Some(Turn {
            describer: describer.clone(),
            word: describer.word_for_round(self.round).map(str::to_string),
            remaining: if timed { timer.remaining() } else { None },
            started_at: if timed { timer.started_at() } else { None },
        })
    }
}

/// The active turn, derived from a session and its timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub describer: Player,
    pub word: Option<String>,
    pub remaining: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEndCause {
    Timeout,
    CorrectAnswer,
}

impl fmt::Display for TurnEndCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnEndCause::Timeout => f.write_str("timeout"),
            TurnEndCause::CorrectAnswer => f.write_str("correct answer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSignal {
    Start,
    TurnEnded { turn: TurnKey, cause: TurnEndCause },
    CorrectAnswer { turn: TurnKey, guesser: PlayerId },
    TurnUpdated(TurnUpdatedPayload),
    PlayerDeparted { player_id: PlayerId },
    Snapshot(PlayerMap),
    RoundReady,
    GameOver(PlayerMap),
}

impl TurnSignal {
    pub fn name(&self) -> &'static str {
        match self {
            TurnSignal::Start => "start",
            TurnSignal::TurnEnded { .. } => "turn-ended",
            TurnSignal::CorrectAnswer { .. } => "correct-answer",
            TurnSignal::TurnUpdated(_) => "turn-updated",
            TurnSignal::PlayerDeparted { .. } => "player-departed",
            TurnSignal::Snapshot(_) => "snapshot",
            TurnSignal::RoundReady => "round-ready",
            TurnSignal::GameOver(_) => "game-over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnChange {
    /// A new describer is active.
    TurnStarted { turn: TurnKey },
    /// The round finished; waiting for the next round's words.
    RoundEnded { next_round: u32 },
    GameOver,
    /// Seats or player data changed, the active turn (if any) did not.
    Reseated,
    /// The signal referred to a turn this client already left.
    Stale,
    /// Already over; the terminal scores replaced the local ones.
    FinalScores,
    Unchanged,
}

impl TurnChange {
    /// Whether the previous turn is over, so its timer must not keep running.
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            TurnChange::TurnStarted { .. } | TurnChange::RoundEnded { .. } | TurnChange::GameOver
        )
    }
}

/// Deterministic transition function shared by every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnCoordinator {
    round_limit: u32,
}

impl TurnCoordinator {
    pub fn new(round_limit: u32) -> Result<Self, SyncError> {
        if round_limit == 0 {
            return Err(SyncError::InvalidRoundLimit);
        }
        Ok(Self { round_limit })
    }

    pub fn round_limit(&self) -> u32 {
        self.round_limit
    }

    /// Apply one signal. On error the session is left exactly as it was.
    pub fn apply(&self, session: &mut Session, signal: TurnSignal) -> Result<TurnChange, SyncError> {
        match signal {
            TurnSignal::Start => self.start(session),
            TurnSignal::TurnEnded { turn, cause } => Ok(self.end_turn(session, turn, cause)),
            TurnSignal::CorrectAnswer { turn, guesser } => {
                self.correct_answer(session, turn, guesser)
            }
            TurnSignal::TurnUpdated(payload) => self.turn_updated(session, payload),
            TurnSignal::PlayerDeparted { player_id } => self.depart(session, player_id),
            TurnSignal::Snapshot(players) => self.snapshot(session, players),
            TurnSignal::RoundReady => self.begin_round(session),
            TurnSignal::GameOver(players) => Ok(self.game_over(session, players)),
        }
    }

    /// The canonical broadcast describing where `session` now stands after
    /// `ended` finished. A finished game is announced as `next_round ==
    /// round_limit`.
    pub fn turn_updated_payload(&self, session: &Session, ended: TurnKey) -> TurnUpdatedPayload {
        let (next_round, next_describer_order) = self.announced_position(session);
        TurnUpdatedPayload {
            ended,
            next_describer_order,
            next_round,
        }
    }

    fn announced_position(&self, session: &Session) -> (u32, usize) {
        match session.phase {
            Phase::GameOver => (self.round_limit, 0),
            _ => session.position(),
        }
    }

    fn start(&self, session: &mut Session) -> Result<TurnChange, SyncError> {
        if session.phase != Phase::Lobby {
            return Err(SyncError::InvalidTransition {
                phase: session.phase,
                signal: "start",
            });
        }
        if session.registry.is_empty() {
            return Err(SyncError::NoSuchSeat { order: 0, seated: 0 });
        }

        session.round = 0;
        session.describer_order = 0;
        session.phase = Phase::InTurn;
        Ok(started(session))
    }

    fn end_turn(&self, session: &mut Session, turn: TurnKey, cause: TurnEndCause) -> TurnChange {
        if session.current_turn() != Some(turn) {
            debug!("Discarding {} for {}, turn already over", cause, turn);
            return TurnChange::Stale;
        }

        debug!("Turn {} ended by {}", turn, cause);
        self.advance(session)
    }

    /// Only the report that actually ends the turn scores. Later reports for
    /// the same turn are stale and leave every score alone.
    fn correct_answer(
        &self,
        session: &mut Session,
        turn: TurnKey,
        guesser: PlayerId,
    ) -> Result<TurnChange, SyncError> {
        if session.current_turn() != Some(turn) {
            debug!("Discarding correct answer by {} for {}, turn already over", guesser, turn);
            return Ok(TurnChange::Stale);
        }
        if guesser == turn.describer {
            warn!("Describer {} cannot score their own word", guesser);
            return Ok(TurnChange::Unchanged);
        }

        let score = session.registry.award_point(&guesser)?;
        debug!("{} scored on {}, now at {}", guesser, turn, score);
        Ok(self.end_turn(session, turn, TurnEndCause::CorrectAnswer))
    }

    fn advance(&self, session: &mut Session) -> TurnChange {
        if session.describer_order + 1 >= session.registry.len() {
            self.finish_round(session)
        } else {
            session.describer_order += 1;
            started(session)
        }
    }

    fn finish_round(&self, session: &mut Session) -> TurnChange {
        session.describer_order = 0;
        if session.round + 1 >= self.round_limit {
            session.phase = Phase::GameOver;
            TurnChange::GameOver
        } else {
            session.round += 1;
            session.phase = Phase::RoundTransition;
            TurnChange::RoundEnded {
                next_round: session.round,
            }
        }
    }

    fn depart(&self, session: &mut Session, player_id: PlayerId) -> Result<TurnChange, SyncError> {
        let departure = session.registry.remove(&player_id)?;
        let old_order = departure.old_order;

        if session.phase == Phase::GameOver {
            return Ok(TurnChange::Reseated);
        }
        if session.registry.is_empty() {
            session.describer_order = 0;
            session.phase = Phase::GameOver;
            return Ok(TurnChange::GameOver);
        }
        if session.phase != Phase::InTurn {
            return Ok(TurnChange::Reseated);
        }

        let describer_order = session.describer_order;
        if old_order < describer_order {
            session.describer_order -= 1;
            Ok(TurnChange::Reseated)
        } else if old_order == describer_order {
            info!(
                "Describer {} left during round {}, ending turn early",
                departure.player.username, session.round
            );
            // The next player in rotation slid down into the vacated seat
            if describer_order < session.registry.len() {
                Ok(started(session))
            } else {
                Ok(self.finish_round(session))
            }
        } else {
            Ok(TurnChange::Reseated)
        }
    }

    fn snapshot(&self, session: &mut Session, players: PlayerMap) -> Result<TurnChange, SyncError> {
        let registry = PlayerRegistry::from_snapshot(players)?;

        match session.phase {
            Phase::Lobby | Phase::GameOver => {
                session.registry = registry;
                Ok(TurnChange::Reseated)
            }
            Phase::RoundTransition => {
                session.registry = registry;
                if session.registry.is_empty() {
                    session.phase = Phase::GameOver;
                    return Ok(TurnChange::GameOver);
                }
                let round = session.round;
                let words_ready = session
                    .registry
                    .ordered()
                    .iter()
                    .all(|p| p.has_word_for_round(round));
                if words_ready {
                    self.begin_round(session)
                } else {
                    Ok(TurnChange::Reseated)
                }
            }
            Phase::InTurn => {
                let previous = session.current_turn();
                session.registry = registry;
                if session.registry.is_empty() {
                    session.describer_order = 0;
                    session.phase = Phase::GameOver;
                    return Ok(TurnChange::GameOver);
                }
                if session.describer_order >= session.registry.len() {
                    warn!(
                        "Snapshot has {} seats but describer is {}, clamping",
                        session.registry.len(),
                        session.describer_order
                    );
                    session.describer_order = session.registry.len() - 1;
                }
                match session.current_turn() {
                    Some(turn) if Some(turn) != previous => Ok(TurnChange::TurnStarted { turn }),
                    _ => Ok(TurnChange::Reseated),
                }
            }
        }
    }

    fn begin_round(&self, session: &mut Session) -> Result<TurnChange, SyncError> {
        match session.phase {
            Phase::RoundTransition => {
                session.describer_order = 0;
                session.phase = Phase::InTurn;
                Ok(started(session))
            }
            Phase::InTurn => Ok(TurnChange::Unchanged),
            phase => Err(SyncError::InvalidTransition {
                phase,
                signal: "round-ready",
            }),
        }
    }

    /// The terminal mapping is the final word on scores, even for a session
    /// that already reached GameOver on its own.
    fn game_over(&self, session: &mut Session, players: PlayerMap) -> TurnChange {
        session.registry.merge(&players);
        if session.phase == Phase::GameOver {
            return TurnChange::FinalScores;
        }
        session.describer_order = 0;
        session.phase = Phase::GameOver;
        TurnChange::GameOver
    }

    fn turn_updated(
        &self,
        session: &mut Session,
        payload: TurnUpdatedPayload,
    ) -> Result<TurnChange, SyncError> {
        let ended = payload.ended;

        if session.current_turn() == Some(ended) {
            let change = self.advance(session);
            let announced = (payload.next_round, payload.next_describer_order);
            if self.announced_position(session) != announced {
                warn!(
                    "Turn update for {} announced {:?}, local rotation gives {:?}",
                    ended,
                    announced,
                    self.announced_position(session)
                );
            }
            return Ok(change);
        }

        if !is_ahead(session, &ended) {
            debug!("Discarding turn update for {}, already past it", ended);
            return Ok(TurnChange::Stale);
        }

        self.fast_forward(session, payload)
    }

    fn fast_forward(
        &self,
        session: &mut Session,
        payload: TurnUpdatedPayload,
    ) -> Result<TurnChange, SyncError> {
        if payload.next_round < payload.ended.round {
            return Err(SyncError::InvalidTransition {
                phase: session.phase,
                signal: "turn-updated",
            });
        }

        info!(
            "Behind the canonical rotation, jumping to round {} describer {}",
            payload.next_round, payload.next_describer_order
        );

        if payload.next_round >= self.round_limit {
            session.describer_order = 0;
            session.phase = Phase::GameOver;
            return Ok(TurnChange::GameOver);
        }

        if payload.next_round > payload.ended.round {
            session.round = payload.next_round;
            session.describer_order = 0;
            session.phase = Phase::RoundTransition;
            return Ok(TurnChange::RoundEnded {
                next_round: payload.next_round,
            });
        }

        if payload.next_describer_order >= session.registry.len() {
            return Err(SyncError::NoSuchSeat {
                order: payload.next_describer_order,
                seated: session.registry.len(),
            });
        }

        session.round = payload.next_round;
        session.describer_order = payload.next_describer_order;
        session.phase = Phase::InTurn;
        Ok(started(session))
    }
}

fn started(session: &Session) -> TurnChange {
    match session.current_turn() {
        Some(turn) => TurnChange::TurnStarted { turn },
        None => {
            warn!(
                "No player at describer seat {} of {}",
                session.describer_order,
                session.registry.len()
            );
            TurnChange::Unchanged
        }
    }
}

/// Whether `ended` lies ahead of where this session currently is.
fn is_ahead(session: &Session, ended: &TurnKey) -> bool {
    match session.phase {
        Phase::Lobby => true,
        Phase::GameOver => false,
        Phase::RoundTransition => ended.round >= session.round,
        Phase::InTurn => {
            if ended.round != session.round {
                return ended.round > session.round;
            }
            // A describer that is no longer seated already had their turn ended here
            session
                .registry
                .get(&ended.describer)
                .is_some_and(|p| p.order > session.describer_order)
        }
    }
}

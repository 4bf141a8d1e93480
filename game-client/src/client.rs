use game_core::{
    PlayerRegistry, Ranking, Session, SessionEvent, SessionEventBus, SessionEventHandler,
    SyncError, TimerSignal, TimerSynchronizer, TimerWatchdog, Turn, TurnChange, TurnCoordinator,
    TurnEndCause, TurnSignal, is_authority,
};
use game_types::{
    ClientMessage, CorrectAnswerPayload, GameOverPayload, Phase, Player, PlayerId,
    PlayerLeftPayload, RelayErrorKind, ServerMessage, StartRoundPayload, TimeUpdatePayload,
    TimerResyncPayload, TurnKey,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{ClientConfig, ClientInput, LocalAction, RelayAdapter};

const MAX_JOIN_BACKOFF: Duration = Duration::from_secs(30);

/// One player's client: owns the local session and turns every input into
/// coordinator signals, timer updates and outbound relay messages.
pub struct GameClient<R> {
    local: Player,
    coordinator: TurnCoordinator,
    session: Session,
    timer: TimerSynchronizer,
    watchdog: TimerWatchdog,
    relay: R,
    events: SessionEventBus,
    turn_seconds: u32,
    broadcast_ticks: bool,
    /// Announcement that arrived before the turn it names started here.
    pending_announcement: Option<StartRoundPayload>,
    connected: bool,
    ever_connected: bool,
    departed: bool,
    /// A rejected join waits here until its retry is due.
    rejoin_at: Option<Instant>,
    join_backoff: Duration,
    base_backoff: Duration,
    game_over_at: Option<Instant>,
    /// The authority's terminal scores are in.
    final_scores: bool,
    final_grace: Duration,
}

impl<R: RelayAdapter> GameClient<R> {
    pub fn new(config: &ClientConfig, relay: R) -> Result<Self, SyncError> {
        Ok(Self {
            local: config.local_player(),
            coordinator: TurnCoordinator::new(config.round_limit)?,
            session: Session::new(config.room_id.clone(), PlayerRegistry::new()),
            timer: TimerSynchronizer::new(),
            watchdog: TimerWatchdog::new(config.watchdog_grace),
            relay,
            events: SessionEventBus::new(),
            turn_seconds: config.turn_seconds,
            broadcast_ticks: config.broadcast_ticks,
            pending_announcement: None,
            connected: false,
            ever_connected: false,
            departed: false,
            rejoin_at: None,
            join_backoff: config.reconnect_delay,
            base_backoff: config.reconnect_delay,
            game_over_at: None,
            final_scores: false,
            final_grace: config.watchdog_grace,
        })
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn player_id(&self) -> PlayerId {
        self.local.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timer(&self) -> &TimerSynchronizer {
        &self.timer
    }

    pub fn turn(&self) -> Option<Turn> {
        self.session.turn(&self.timer)
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_departed(&self) -> bool {
        self.departed
    }

    pub fn is_finished(&self) -> bool {
        self.session.phase() == Phase::GameOver
    }

    /// Nothing left to wait for: we left, or the game is over and the
    /// authority's final scores are in or the grace period has run out.
    pub fn is_settled(&self, now: Instant) -> bool {
        if self.departed {
            return true;
        }
        if !self.is_finished() {
            return false;
        }
        self.final_scores
            || self
                .game_over_at
                .is_some_and(|at| now.saturating_duration_since(at) >= self.final_grace)
    }

    pub fn has_final_scores(&self) -> bool {
        self.final_scores
    }

    pub fn is_authority(&self) -> bool {
        is_authority(self.session.registry(), &self.local.id)
    }

    /// Handle one input to completion.
    pub fn handle(&mut self, input: ClientInput, now: Instant) {
        if self.departed {
            debug!("Ignoring {} after leaving", input.name());
            return;
        }

        match input {
            ClientInput::Local(action) => self.handle_local(action, now),
            ClientInput::Relay(message) => self.handle_relay(message, now),
            ClientInput::Tick => self.handle_tick(now),
            ClientInput::RelayConnected => self.handle_connected(),
            ClientInput::RelayDisconnected => self.handle_disconnected(),
        }
    }

    fn handle_local(&mut self, action: LocalAction, now: Instant) {
        if !self.connected && !matches!(action, LocalAction::Leave) {
            debug!("Relay unavailable, dropping {}", action.name());
            return;
        }

        match action {
            LocalAction::StartSession => self.apply_and_settle(TurnSignal::Start, now),
            LocalAction::ReportCorrectAnswer { guesser } => {
                self.report_correct_answer(guesser, now)
            }
            LocalAction::SetupPlayer {
                assigned_words,
                notes,
            } => self.setup_player(assigned_words, notes),
            LocalAction::RoundReady => self.apply_and_settle(TurnSignal::RoundReady, now),
            LocalAction::Leave => self.leave(),
        }
    }

    fn handle_relay(&mut self, message: ServerMessage, now: Instant) {
        if !self.connected {
            debug!("Dropping {} while disconnected", message.name());
            return;
        }

        match message {
            ServerMessage::PlayerChange(players) => {
                if players.contains_key(&self.local.id) {
                    self.rejoin_at = None;
                    self.join_backoff = self.base_backoff;
                }
                self.apply_and_settle(TurnSignal::Snapshot(players), now)
            }
            ServerMessage::StartRound(payload) => self.handle_start_round(payload, now),
            ServerMessage::CorrectAnswer(payload) => self.end_turn(
                TurnSignal::CorrectAnswer {
                    turn: payload.turn,
                    guesser: payload.guesser,
                },
                payload.turn,
                now,
            ),
            ServerMessage::TurnUpdated(payload) => {
                self.apply_and_settle(TurnSignal::TurnUpdated(payload), now)
            }
            ServerMessage::PlayerLeft(payload) => self.handle_player_left(payload, now),
            ServerMessage::GameOver(payload) => {
                if let Some(change) = self.apply(TurnSignal::GameOver(payload.players)) {
                    self.final_scores = true;
                    self.settle(change, now);
                }
            }
            ServerMessage::TimeUpdate(payload) => self.handle_time_update(payload, now),
            ServerMessage::RequestTimerResync(payload) => self.handle_timer_resync(payload),
            ServerMessage::Error { error } => self.handle_relay_error(error, now),
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        if !self.connected {
            return;
        }

        if self.rejoin_at.is_some_and(|at| now >= at) {
            self.rejoin_at = None;
            info!("Retrying join for room {}", self.session.room_id());
            self.join();
        }

        if let Some(missing) = self.watchdog.check(now) {
            warn!("{}, asking the authority to resync", missing);
            self.emit(ClientMessage::RequestTimerResync(TimerResyncPayload {
                turn: missing.turn,
            }));
        }

        let signal = self.timer.tick();
        self.on_timer_signal(signal, now, true);
    }

    fn handle_connected(&mut self) {
        info!(
            "Relay connection ready, joining room {}",
            self.session.room_id()
        );
        self.connected = true;
        self.rejoin_at = None;
        self.join();

        if self.ever_connected {
            self.events.publish(SessionEvent::RelayRestored {
                room_id: self.session.room_id().to_string(),
            });
        }
        self.ever_connected = true;
    }

    fn handle_disconnected(&mut self) {
        if !self.connected {
            return;
        }

        warn!(
            "Lost relay connection for room {}, freezing until it returns",
            self.session.room_id()
        );
        self.connected = false;
        self.rejoin_at = None;
        self.events.publish(SessionEvent::RelayLost {
            room_id: self.session.room_id().to_string(),
        });
    }

    fn report_correct_answer(&mut self, guesser: PlayerId, now: Instant) {
        let Some(turn) = self.session.current_turn() else {
            debug!("No active turn to score for {}", guesser);
            return;
        };
        if turn.describer == guesser {
            warn!("Describer {} cannot guess their own word", guesser);
            return;
        }

        let mut players = self.session.registry().snapshot();
        let Some(player) = players.get_mut(&guesser) else {
            warn!("Correct answer from unseated player {}", guesser);
            return;
        };
        player.score += 1;
        info!("{} guessed the word for {}", player.username, turn);

        self.emit(ClientMessage::CorrectAnswer(CorrectAnswerPayload {
            players,
            turn,
            guesser,
        }));
        self.end_turn(TurnSignal::CorrectAnswer { turn, guesser }, turn, now);
    }

    fn setup_player(&mut self, assigned_words: Vec<String>, notes: String) {
        self.local.assigned_words = assigned_words;
        self.local.notes = notes;

        let mut player = self
            .session
            .registry()
            .get(&self.local.id)
            .cloned()
            .unwrap_or_else(|| self.local.clone());
        player.assigned_words = self.local.assigned_words.clone();
        player.notes = self.local.notes.clone();
        self.emit(ClientMessage::UpdatePlayer { player });
    }

    fn leave(&mut self) {
        info!("Leaving room {}", self.session.room_id());
        self.emit(ClientMessage::QuitGame {
            player: self.local.id,
            room_id: self.session.room_id().to_string(),
        });
        self.departed = true;
        self.timer.reset();
        self.watchdog.clear();
        self.pending_announcement = None;
    }

    fn handle_start_round(&mut self, payload: StartRoundPayload, now: Instant) {
        let turn = payload.turn;
        if self.session.current_turn() == Some(turn) {
            self.arm(turn, payload.duration);
            return;
        }

        self.pending_announcement = Some(payload);
        if self.session.phase() == Phase::Lobby {
            info!(
                "Authority started the game in room {}",
                self.session.room_id()
            );
            self.apply_and_settle(TurnSignal::Start, now);
        } else {
            debug!("Holding announcement for {}, not the current turn", turn);
        }
    }

    fn handle_player_left(&mut self, payload: PlayerLeftPayload, now: Instant) {
        let player_id = payload.player_id;
        if !self.session.registry().contains(&player_id) {
            debug!("Player {} already gone", player_id);
            return;
        }

        let Some(change) = self.apply(TurnSignal::PlayerDeparted { player_id }) else {
            return;
        };
        info!(
            "Player {} left room {}, {} remaining",
            player_id,
            self.session.room_id(),
            self.session.player_count()
        );
        self.events.publish(SessionEvent::PlayerLeft {
            room_id: self.session.room_id().to_string(),
            player_id,
        });

        if let (Some(round), Some(order)) = (payload.next_round, payload.next_describer_order) {
            if self.session.position() != (round, order) {
                warn!(
                    "Departure suggested ({}, {}), local rotation gives {:?}",
                    round,
                    order,
                    self.session.position()
                );
            }
        }

        self.settle(change, now);
        if change == TurnChange::GameOver && self.is_authority() {
            self.announce_game_over();
        }

        if !self
            .session
            .registry()
            .same_members(&payload.remaining_players)
        {
            debug!("Roster differs from the relay after departure, requesting snapshot");
            self.emit(ClientMessage::RequestSnapshot);
        }
    }

    fn handle_time_update(&mut self, payload: TimeUpdatePayload, now: Instant) {
        if self.session.current_turn() != Some(payload.turn) {
            debug!("Discarding time update for {}", payload.turn);
            return;
        }

        self.watchdog.observe(payload.turn);
        let signal = self.timer.observe_remaining(payload.turn, payload.remaining);
        self.on_timer_signal(signal, now, false);
    }

    fn handle_timer_resync(&mut self, payload: TimerResyncPayload) {
        if !self.is_authority() {
            return;
        }
        if self.session.current_turn() != Some(payload.turn) {
            debug!("Resync requested for {}, not the current turn", payload.turn);
            return;
        }

        let duration = match self.timer.remaining() {
            Some(remaining) if self.timer.turn() == Some(payload.turn) => remaining,
            _ => self.turn_seconds,
        };
        info!("Re-announcing {} with {}s left", payload.turn, duration);
        self.announce_turn(payload.turn, duration);
    }

    fn handle_relay_error(&mut self, error: RelayErrorKind, now: Instant) {
        warn!("Relay rejected a message: {}", error);
        match error {
            RelayErrorKind::NotInRoom
            | RelayErrorKind::RoomNotFound { .. }
            | RelayErrorKind::AlreadySeated { .. }
            | RelayErrorKind::RateLimitExceeded => self.schedule_rejoin(now),
            RelayErrorKind::InvalidMessage { .. } => {}
        }
    }

    /// Retry the join after the current backoff, doubling it for next time.
    /// Errors that arrive while a retry is pending do not push it back.
    fn schedule_rejoin(&mut self, now: Instant) {
        if self.rejoin_at.is_some() {
            return;
        }
        debug!("Rejoining room {} in {:?}", self.session.room_id(), self.join_backoff);
        self.rejoin_at = Some(now + self.join_backoff);
        self.join_backoff = (self.join_backoff * 2).min(MAX_JOIN_BACKOFF);
    }

    /// Join with whatever the roster last knew about us, then ask for the roster.
    fn join(&mut self) {
        let player = self
            .session
            .registry()
            .get(&self.local.id)
            .cloned()
            .unwrap_or_else(|| self.local.clone());
        self.emit(ClientMessage::JoinRoom {
            room_id: self.session.room_id().to_string(),
            player,
        });
        self.emit(ClientMessage::RequestSnapshot);
    }

    fn on_timer_signal(&mut self, signal: Option<TimerSignal>, now: Instant, local_clock: bool) {
        let rebroadcast = local_clock && self.broadcast_ticks && self.is_authority();

        match signal {
            Some(TimerSignal::Tick { turn, remaining }) => {
                if rebroadcast {
                    self.emit(ClientMessage::TimeUpdate(TimeUpdatePayload { remaining, turn }));
                }
                self.events
                    .publish(SessionEvent::TimerTick { turn, remaining });
            }
            Some(TimerSignal::Timeout { turn }) => {
                if rebroadcast {
                    self.emit(ClientMessage::TimeUpdate(TimeUpdatePayload {
                        remaining: 0,
                        turn,
                    }));
                }
                info!("Time is up for {}", turn);
                self.end_turn(
                    TurnSignal::TurnEnded {
                        turn,
                        cause: TurnEndCause::Timeout,
                    },
                    turn,
                    now,
                );
            }
            None => {}
        }
    }

    /// Apply a timeout or correct answer. The authority follows a real turn
    /// end with the canonical `turn-updated`.
    fn end_turn(&mut self, signal: TurnSignal, ended: TurnKey, now: Instant) {
        let Some(change) = self.apply(signal) else {
            return;
        };

        let authority = self.is_authority();
        if authority && change.ends_turn() {
            let payload = self.coordinator.turn_updated_payload(&self.session, ended);
            self.emit(ClientMessage::TurnUpdated(payload));
        }

        self.settle(change, now);
        if authority && change == TurnChange::GameOver {
            self.announce_game_over();
        }
    }

    fn apply_and_settle(&mut self, signal: TurnSignal, now: Instant) {
        if let Some(change) = self.apply(signal) {
            self.settle(change, now);
        }
    }

    fn apply(&mut self, signal: TurnSignal) -> Option<TurnChange> {
        let name = signal.name();
        match self.coordinator.apply(&mut self.session, signal) {
            Ok(change) => Some(change),
            Err(e) if e.needs_resync() => {
                error!(
                    "Rejected {} in room {}: {}, requesting snapshot",
                    name,
                    self.session.room_id(),
                    e
                );
                self.events.publish(SessionEvent::Desync {
                    room_id: self.session.room_id().to_string(),
                    reason: e.to_string(),
                });
                self.emit(ClientMessage::RequestSnapshot);
                None
            }
            Err(e) => {
                warn!("Ignoring {}: {}", name, e);
                None
            }
        }
    }

    fn settle(&mut self, change: TurnChange, now: Instant) {
        match change {
            TurnChange::TurnStarted { turn } => self.on_turn_started(turn, now),
            TurnChange::RoundEnded { next_round } => {
                self.timer.reset();
                self.watchdog.clear();
                info!(
                    "Room {} waiting for round {} words",
                    self.session.room_id(),
                    next_round
                );
                self.events.publish(SessionEvent::RoundEnded {
                    room_id: self.session.room_id().to_string(),
                    next_round,
                });
            }
            TurnChange::GameOver => self.on_game_over(now),
            TurnChange::FinalScores => {
                info!("Final scores in for room {}", self.session.room_id());
                self.publish_standings();
            }
            TurnChange::Reseated => self.claim_authority_timer(),
            TurnChange::Stale => debug!("Signal referred to a finished turn"),
            TurnChange::Unchanged => {}
        }
    }

    fn on_turn_started(&mut self, turn: TurnKey, now: Instant) {
        self.timer.reset();
        self.watchdog.watch(turn, now);

        let describer_name = self
            .session
            .describer()
            .map(|p| p.username.clone())
            .unwrap_or_default();
        info!("{} started, {} is describing", turn, describer_name);
        self.events.publish(SessionEvent::TurnStarted {
            room_id: self.session.room_id().to_string(),
            turn,
            describer_name,
        });

        if self.is_authority() {
            self.pending_announcement = None;
            self.announce_turn(turn, self.turn_seconds);
        } else if let Some(pending) = self.pending_announcement.take_if(|p| p.turn == turn) {
            self.arm(pending.turn, pending.duration);
        }
    }

    fn on_game_over(&mut self, now: Instant) {
        self.timer.reset();
        self.watchdog.clear();
        self.pending_announcement = None;
        self.game_over_at = Some(now);
        self.publish_standings();
    }

    fn publish_standings(&mut self) {
        let standings = Ranking::standings(&self.session.registry().snapshot());
        if let Some(outcome) = Ranking::outcome_for(&standings, &self.local.id) {
            info!(
                "Game over in room {}: finished #{} of {} ({})",
                self.session.room_id(),
                outcome.rank,
                standings.len(),
                if outcome.win { "win" } else { "loss" }
            );
        }
        self.events.publish(SessionEvent::GameOver {
            room_id: self.session.room_id().to_string(),
            standings,
        });
    }

    /// Seat 0 may have just become ours mid-turn.
    fn claim_authority_timer(&mut self) {
        let Some(turn) = self.session.current_turn() else {
            return;
        };
        if self.is_authority() && self.timer.turn() != Some(turn) {
            info!("Taking over timing of {} as authority", turn);
            self.announce_turn(turn, self.turn_seconds);
        }
    }

    fn announce_turn(&mut self, turn: TurnKey, duration: u32) {
        self.arm(turn, duration);
        self.emit(ClientMessage::StartRound(StartRoundPayload { duration, turn }));
    }

    fn announce_game_over(&mut self) {
        self.final_scores = true;
        self.emit(ClientMessage::GameOver(GameOverPayload {
            players: self.session.registry().snapshot(),
        }));
    }

    fn arm(&mut self, turn: TurnKey, duration: u32) {
        self.timer.arm(turn, duration);
        self.watchdog.observe(turn);
    }

    fn emit(&self, message: ClientMessage) {
        let name = message.name();
        if let Err(e) = self.relay.emit(message) {
            warn!("Could not emit {}: {}", name, e);
        }
    }
}

#![allow(dead_code)]

use game_client::{ClientConfig, ClientInput, GameClient, LocalAction, RelayAdapter, RelayError};
use game_core::{SessionEvent, SessionEventHandler};
use game_types::{ClientMessage, PlayerId, PlayerLeftPayload, PlayerMap, ServerMessage};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Relay stand-in that keeps everything a client emitted
#[derive(Debug, Clone, Default)]
pub struct RecordingRelay {
    sent: Arc<Mutex<Vec<ClientMessage>>>,
}

impl RecordingRelay {
    pub fn take(&self) -> Vec<ClientMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

impl RelayAdapter for RecordingRelay {
    fn emit(&self, message: ClientMessage) -> Result<(), RelayError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingHandler {
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl SessionEventHandler for RecordingHandler {
    fn handle_event(&mut self, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub type TestClient = GameClient<RecordingRelay>;

pub fn create_test_config(name: &str) -> ClientConfig {
    ClientConfig {
        relay_url: "ws://relay.test/ws".to_string(),
        room_id: "test-room".to_string(),
        player_id: Uuid::new_v4(),
        player_name: name.to_string(),
        avatar_ref: format!("avatars/{}", name.to_lowercase()),
        round_limit: 3,
        turn_seconds: 10,
        watchdog_grace: Duration::from_secs(3),
        reconnect_delay: Duration::from_millis(10),
        heartbeat_interval: Duration::from_secs(30),
        broadcast_ticks: false,
    }
}

/// Builds the relay's roster for players seated in the given order
pub fn roster_for(configs: &[ClientConfig]) -> PlayerMap {
    configs
        .iter()
        .enumerate()
        .map(|(order, config)| {
            let player = config.local_player().with_order(order);
            (player.id, player)
        })
        .collect()
}

/// A table of connected clients that all hold the same lobby roster
pub struct Table {
    pub clients: Vec<TestClient>,
    pub ids: Vec<PlayerId>,
    pub now: Instant,
}

impl Table {
    pub fn new(names: &[&str], round_limit: u32) -> Self {
        Self::with_config(names, |config| config.round_limit = round_limit)
    }

    pub fn with_config(names: &[&str], tweak: impl Fn(&mut ClientConfig)) -> Self {
        let configs: Vec<ClientConfig> = names
            .iter()
            .map(|name| {
                let mut config = create_test_config(name);
                tweak(&mut config);
                config
            })
            .collect();
        let roster = roster_for(&configs);
        let now = Instant::now();

        let clients = configs
            .iter()
            .map(|config| {
                let mut client = GameClient::new(config, RecordingRelay::default()).unwrap();
                client.handle(ClientInput::RelayConnected, now);
                client.handle(ClientInput::Relay(ServerMessage::PlayerChange(roster.clone())), now);
                client.relay().take();
                client
            })
            .collect();

        Self {
            clients,
            ids: configs.iter().map(|c| c.player_id).collect(),
            now,
        }
    }

    pub fn local(&mut self, seat: usize, action: LocalAction) {
        let now = self.now;
        self.clients[seat].handle(ClientInput::Local(action), now);
    }

    pub fn relay_to(&mut self, seat: usize, message: ServerMessage) {
        let now = self.now;
        self.clients[seat].handle(ClientInput::Relay(message), now);
    }

    /// Advance the shared clock one second and tick the given seats
    pub fn tick(&mut self, seats: &[usize]) {
        self.now += Duration::from_secs(1);
        let now = self.now;
        for seat in seats {
            self.clients[*seat].handle(ClientInput::Tick, now);
        }
    }

    pub fn tick_all(&mut self, times: usize) {
        let seats: Vec<usize> = (0..self.clients.len()).collect();
        for _ in 0..times {
            self.tick(&seats);
        }
    }

    pub fn sent(&self, seat: usize) -> Vec<ClientMessage> {
        self.clients[seat].relay().take()
    }

    pub fn sent_names(&self, seat: usize) -> Vec<&'static str> {
        self.sent(seat).iter().map(|m| m.name()).collect()
    }

    /// Fan out what `seat` emitted the way the relay would, to every other
    /// client still in the room, and return what was sent
    pub fn deliver_from(&mut self, seat: usize) -> Vec<ClientMessage> {
        let sent = self.sent(seat);
        for message in sent.clone() {
            let outgoing = match message {
                ClientMessage::QuitGame { player, .. } => {
                    let mut remaining = self.clients[seat].session().registry().snapshot();
                    remaining.remove(&player);
                    Some(ServerMessage::PlayerLeft(PlayerLeftPayload {
                        player_id: player,
                        next_describer_order: None,
                        next_round: None,
                        remaining_players: remaining,
                    }))
                }
                other => other.into_broadcast(),
            };

            if let Some(outgoing) = outgoing {
                for other in 0..self.clients.len() {
                    if other != seat && !self.clients[other].is_departed() {
                        self.relay_to(other, outgoing.clone());
                    }
                }
            }
        }
        sent
    }
}

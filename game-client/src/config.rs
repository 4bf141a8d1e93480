use game_types::{Player, PlayerId, RoomId};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub avatar_ref: String,
    pub round_limit: u32,
    pub turn_seconds: u32,
    pub watchdog_grace: Duration,
    pub reconnect_delay: Duration,
    /// How often the transport pings the relay.
    pub heartbeat_interval: Duration,
    /// Relay the authority's countdown as `time-update` every second.
    pub broadcast_ticks: bool,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let room_id = lookup("ROOM_ID").ok_or(ConfigError::Missing { name: "ROOM_ID" })?;
        let player_name =
            lookup("PLAYER_NAME").ok_or(ConfigError::Missing { name: "PLAYER_NAME" })?;

        let player_id = match lookup("PLAYER_ID") {
            Some(value) => Uuid::parse_str(&value).map_err(|_| ConfigError::Invalid {
                name: "PLAYER_ID",
                value,
            })?,
            None => Uuid::new_v4(),
        };

        let round_limit: u32 = parse_or(&lookup, "ROUND_LIMIT", 3)?;
        if round_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "ROUND_LIMIT",
                value: "0".to_string(),
            });
        }
        let turn_seconds: u32 = parse_or(&lookup, "TURN_SECONDS", 60)?;
        if turn_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "TURN_SECONDS",
                value: "0".to_string(),
            });
        }

        let heartbeat_seconds: u64 = parse_or(&lookup, "HEARTBEAT_SECONDS", 30)?;
        if heartbeat_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "HEARTBEAT_SECONDS",
                value: "0".to_string(),
            });
        }
        let heartbeat_interval = Duration::from_secs(heartbeat_seconds);

        Ok(Self {
            relay_url: lookup("RELAY_URL").unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string()),
            room_id,
            player_id,
            player_name,
            avatar_ref: lookup("AVATAR_REF").unwrap_or_default(),
            round_limit,
            turn_seconds,
            watchdog_grace: Duration::from_secs(parse_or(&lookup, "WATCHDOG_GRACE_SECONDS", 5)?),
            reconnect_delay: Duration::from_millis(parse_or(&lookup, "RECONNECT_DELAY_MS", 2000)?),
            heartbeat_interval,
            broadcast_ticks: parse_or(&lookup, "BROADCAST_TICKS", false)?,
        })
    }

    /// The local player as sent in `join-room`. The relay picks the seat.
    pub fn local_player(&self) -> Player {
        Player::new(self.player_id, self.player_name.clone(), self.avatar_ref.clone())
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

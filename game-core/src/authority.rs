use game_types::{Player, PlayerId, TurnKey};
use std::time::{Duration, Instant};

use crate::{MissingAuthorityTimer, PlayerRegistry};

/// The seat whose client announces turn timing.
pub const AUTHORITY_SEAT: usize = 0;

/// The player currently responsible for timer announcements. Derived from the
/// seating on every call, never stored.
pub fn authority(registry: &PlayerRegistry) -> Option<&Player> {
    registry.by_order(AUTHORITY_SEAT).ok()
}

pub fn is_authority(registry: &PlayerRegistry, player_id: &PlayerId) -> bool {
    registry
        .get(player_id)
        .is_some_and(|p| p.order == AUTHORITY_SEAT)
}

#[derive(Debug, Clone)]
struct Watch {
    turn: TurnKey,
    since: Instant,
    satisfied: bool,
}

/// Notices turns that started without any timer announcement reaching us.
#[derive(Debug, Clone)]
pub struct TimerWatchdog {
    grace: Duration,
    watching: Option<Watch>,
}

impl Default for TimerWatchdog {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl TimerWatchdog {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            watching: None,
        }
    }

    /// A turn started at `now`.
    pub fn watch(&mut self, turn: TurnKey, now: Instant) {
        self.watching = Some(Watch {
            turn,
            since: now,
            satisfied: false,
        });
    }

    /// A timer announcement or tick for `turn` was observed.
    pub fn observe(&mut self, turn: TurnKey) {
        if let Some(watch) = self.watching.as_mut().filter(|w| w.turn == turn) {
            watch.satisfied = true;
        }
    }

    pub fn clear(&mut self) {
        self.watching = None;
    }

    /// Reports a missing timer once per grace period until one is observed.
    pub fn check(&mut self, now: Instant) -> Option<MissingAuthorityTimer> {
        let watch = self.watching.as_mut()?;
        if watch.satisfied || now.saturating_duration_since(watch.since) < self.grace {
            return None;
        }

        watch.since = now;
        Some(MissingAuthorityTimer { turn: watch.turn })
    }
}

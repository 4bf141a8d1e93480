use chrono::{DateTime, Utc};
use game_types::TurnKey;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { turn: TurnKey, remaining: u32 },
    /// Emitted once per turn, when the countdown first reaches zero.
    Timeout { turn: TurnKey },
}

#[derive(Debug, Clone)]
struct ActiveTimer {
    turn: TurnKey,
    remaining: u32,
    started_at: DateTime<Utc>,
    expired: bool,
}

/// Local countdown for the current turn, started from the authority's
/// announcement and ticked once per second. Drift between clients is
/// accepted.
#[derive(Debug, Clone, Default)]
pub struct TimerSynchronizer {
    active: Option<ActiveTimer>,
}

impl TimerSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resynchronise) the countdown for `turn`.
    pub fn arm(&mut self, turn: TurnKey, duration: u32) {
        if let Some(timer) = self.active.as_mut().filter(|t| t.turn == turn) {
            if timer.expired {
                debug!("Ignoring announcement for {}, already timed out", turn);
            } else {
                timer.remaining = duration;
            }
            return;
        }

        self.active = Some(ActiveTimer {
            turn,
            remaining: duration,
            started_at: Utc::now(),
            expired: false,
        });
    }

    /// One local second elapsed.
    pub fn tick(&mut self) -> Option<TimerSignal> {
        let timer = self.active.as_mut()?;
        if timer.expired {
            return None;
        }

        timer.remaining = timer.remaining.saturating_sub(1);
        Self::settle(timer)
    }

    /// A relayed `time-update`: adopt the authority's remaining seconds.
    pub fn observe_remaining(&mut self, turn: TurnKey, remaining: u32) -> Option<TimerSignal> {
        if self.turn() != Some(turn) {
            self.arm(turn, remaining);
        }

        let timer = self.active.as_mut()?;
        if timer.expired {
            debug!("Discarding repeated zero for {}", turn);
            return None;
        }

        timer.remaining = remaining;
        Self::settle(timer)
    }

    fn settle(timer: &mut ActiveTimer) -> Option<TimerSignal> {
        if timer.remaining == 0 {
            timer.expired = true;
            Some(TimerSignal::Timeout { turn: timer.turn })
        } else {
            Some(TimerSignal::Tick {
                turn: timer.turn,
                remaining: timer.remaining,
            })
        }
    }

    /// Drop the countdown so nothing can fire into the next turn.
    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn turn(&self) -> Option<TurnKey> {
        self.active.as_ref().map(|t| t.turn)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.active.as_ref().map(|t| t.remaining)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(|t| t.started_at)
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn key(round: u32) -> TurnKey {
        TurnKey::new(round, Uuid::new_v4())
    }

    #[test]
    fn test_counts_down_then_times_out_once() {
        let mut timer = TimerSynchronizer::new();
        let turn = key(0);
        timer.arm(turn, 3);

        assert_eq!(timer.tick(), Some(TimerSignal::Tick { turn, remaining: 2 }));
        assert_eq!(timer.tick(), Some(TimerSignal::Tick { turn, remaining: 1 }));
        assert_eq!(timer.tick(), Some(TimerSignal::Timeout { turn }));
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.tick(), None);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_repeated_relayed_zero_fires_once() {
        let mut timer = TimerSynchronizer::new();
        let turn = key(0);

        assert_eq!(
            timer.observe_remaining(turn, 1),
            Some(TimerSignal::Tick { turn, remaining: 1 })
        );
        assert_eq!(
            timer.observe_remaining(turn, 0),
            Some(TimerSignal::Timeout { turn })
        );
        assert_eq!(timer.observe_remaining(turn, 0), None);
    }

    #[test]
    fn test_reset_prevents_stale_fire() {
        let mut timer = TimerSynchronizer::new();
        timer.arm(key(0), 1);
        timer.reset();

        assert_eq!(timer.tick(), None);
        assert_eq!(timer.turn(), None);
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn test_rearm_same_turn_resyncs_remaining() {
        let mut timer = TimerSynchronizer::new();
        let turn = key(1);
        timer.arm(turn, 10);
        timer.tick();
        let started = timer.started_at();

        timer.arm(turn, 4);

        assert_eq!(timer.remaining(), Some(4));
        assert_eq!(timer.started_at(), started);
    }

    #[test]
    fn test_rearm_after_timeout_does_not_resurrect() {
        let mut timer = TimerSynchronizer::new();
        let turn = key(0);
        timer.arm(turn, 1);
        assert_eq!(timer.tick(), Some(TimerSignal::Timeout { turn }));

        timer.arm(turn, 30);

        assert_eq!(timer.remaining(), Some(0));
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_new_turn_replaces_old_timer() {
        let mut timer = TimerSynchronizer::new();
        let first = key(0);
        let second = key(0);
        timer.arm(first, 1);
        timer.arm(second, 5);

        assert_eq!(timer.turn(), Some(second));
        assert_eq!(
            timer.tick(),
            Some(TimerSignal::Tick {
                turn: second,
                remaining: 4
            })
        );
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::PlayerId;

/// Player mapping as it travels over the relay, keyed by player id.
pub type PlayerMap = HashMap<PlayerId, Player>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub avatar_ref: String,
    pub score: u32,
    /// Seat index, dense within a session.
    pub order: usize,
    /// One word per round, supplied by the round-setup step.
    pub assigned_words: Vec<String>,
    /// Describer-owned scratch text.
    pub notes: String,
}

impl Player {
    pub fn new(id: PlayerId, username: impl Into<String>, avatar_ref: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar_ref: avatar_ref.into(),
            score: 0,
            order: 0,
            assigned_words: Vec::new(),
            notes: String::new(),
        }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn word_for_round(&self, round: u32) -> Option<&str> {
        self.assigned_words.get(round as usize).map(String::as_str)
    }

    pub fn has_word_for_round(&self, round: u32) -> bool {
        self.word_for_round(round).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_word_for_round() {
        let mut player = Player::new(Uuid::new_v4(), "Alice", "avatars/alice");
        player.assigned_words = vec!["apple".to_string(), "river".to_string()];

        assert_eq!(player.word_for_round(0), Some("apple"));
        assert_eq!(player.word_for_round(1), Some("river"));
        assert_eq!(player.word_for_round(2), None);
        assert!(!player.has_word_for_round(2));
    }
}

use game_types::{PlayerId, PlayerMap, Standing};

/// How the game ended for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    pub rank: u32,
    /// Finished in the top half of the table.
    pub win: bool,
}

pub struct Ranking;

impl Ranking {
    /// Descending score; equal scores go to the earlier seat.
    pub fn standings(players: &PlayerMap) -> Vec<Standing> {
        let mut ordered: Vec<_> = players.values().collect();
        ordered.sort_by(|a, b| b.score.cmp(&a.score).then(a.order.cmp(&b.order)));

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, player)| Standing {
                player_id: player.id,
                username: player.username.clone(),
                score: player.score,
                order: player.order,
                rank: i as u32 + 1,
            })
            .collect()
    }

    pub fn outcome_for(standings: &[Standing], player_id: &PlayerId) -> Option<GameOutcome> {
        let standing = standings.iter().find(|s| s.player_id == *player_id)?;
        let half = standings.len() as u32 / 2;
        Some(GameOutcome {
            rank: standing.rank,
            win: standing.rank <= half,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::Player;
    use uuid::Uuid;

    fn players(scores: &[u32]) -> (PlayerMap, Vec<PlayerId>) {
        let mut map = PlayerMap::new();
        let mut ids = Vec::new();
        for (order, score) in scores.iter().enumerate() {
            let mut player = Player::new(Uuid::new_v4(), format!("p{}", order), "").with_order(order);
            player.score = *score;
            ids.push(player.id);
            map.insert(player.id, player);
        }
        (map, ids)
    }

    #[test]
    fn test_highest_score_ranks_first() {
        let (map, ids) = players(&[3, 9, 5]);

        let standings = Ranking::standings(&map);

        let ranked: Vec<PlayerId> = standings.iter().map(|s| s.player_id).collect();
        assert_eq!(ranked, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[2].rank, 3);
    }

    #[test]
    fn test_ties_go_to_earlier_seat() {
        let (map, ids) = players(&[4, 4, 4, 1]);

        let standings = Ranking::standings(&map);

        assert_eq!(standings[0].player_id, ids[0]);
        assert_eq!(standings[1].player_id, ids[1]);
        assert_eq!(standings[2].player_id, ids[2]);
        assert_eq!(standings[3].player_id, ids[3]);
    }

    #[test]
    fn test_top_half_wins() {
        let (map, ids) = players(&[10, 2, 8, 0]);
        let standings = Ranking::standings(&map);

        assert_eq!(
            Ranking::outcome_for(&standings, &ids[0]),
            Some(GameOutcome { rank: 1, win: true })
        );
        assert_eq!(
            Ranking::outcome_for(&standings, &ids[2]),
            Some(GameOutcome { rank: 2, win: true })
        );
        assert_eq!(
            Ranking::outcome_for(&standings, &ids[1]),
            Some(GameOutcome { rank: 3, win: false })
        );
        assert!(Ranking::outcome_for(&standings, &Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_single_player_cannot_win() {
        let (map, ids) = players(&[7]);
        let standings = Ranking::standings(&map);

        assert_eq!(
            Ranking::outcome_for(&standings, &ids[0]),
            Some(GameOutcome { rank: 1, win: false })
        );
    }
}

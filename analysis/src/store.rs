use std::collections::HashMap;

use chess::{Game, PieceColor, PositionKey};
use engine::MAX_MULTIPV;
use serde::{Deserialize, Serialize};

use crate::reconciler::TopMove;

/// Ranked suggestions for the position currently being searched.
///
/// Slot `rank - 1` holds the latest line for that rank. Ranks can arrive in
/// any order, so slots may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedTopMoves {
    slots: Vec<Option<TopMove>>,
}

impl RankedTopMoves {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `top_move` at `rank`, replacing any earlier line of that rank.
    /// Rank 0 is treated as rank 1; ranks above [`MAX_MULTIPV`] are dropped
    /// and `false` is returned.
    pub fn insert(&mut self, rank: u32, top_move: TopMove) -> bool {
        if rank > MAX_MULTIPV {
            return false;
        }
        let index = rank.max(1) as usize - 1;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(top_move);
        true
    }

    pub fn get(&self, rank: u32) -> Option<&TopMove> {
        let index = (rank as usize).checked_sub(1)?;
        self.slots.get(index)?.as_ref()
    }

    pub fn best(&self) -> Option<&TopMove> {
        self.get(1)
    }

    /// Filled slots as `(rank, top_move)`, best first.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &TopMove)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|m| (i as u32 + 1, m)))
    }

    /// Filled slots only, best first.
    pub fn to_vec(&self) -> Vec<TopMove> {
        self.iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Engine suggestions accumulated per position, across every search of an
/// analysis session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionTopMoves {
    by_position: HashMap<PositionKey, Vec<TopMove>>,
}

impl PositionTopMoves {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suggestion for `key`. A suggestion with the same notation is
    /// replaced in place; anything else is appended.
    pub fn merge(&mut self, key: PositionKey, top_move: TopMove) {
        let moves = self.by_position.entry(key).or_default();
        match moves.iter_mut().find(|m| m.notation == top_move.notation) {
            Some(existing) => *existing = top_move,
            None => moves.push(top_move),
        }
    }

    /// Suggestions recorded for `key`, in arrival order.
    pub fn get(&self, key: &PositionKey) -> &[TopMove] {
        self.by_position.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// Mark each played move against what the engine suggested in the
    /// position it was played from.
    pub fn annotate(&self, game: &Game) -> Vec<MoveAnnotation> {
        game.history()
            .iter()
            .enumerate()
            .map(|(i, played)| {
                let suggestions = self.get(&played.key_before);
                let verdict = if suggestions.is_empty() {
                    MoveVerdict::Unanalysed
                } else if suggestions.iter().any(|m| m.notation == played.san) {
                    MoveVerdict::TopMove
                } else {
                    MoveVerdict::NotTopMove
                };
                MoveAnnotation {
                    ply: i + 1,
                    san: played.san.clone(),
                    color: played.color,
                    verdict,
                    suggestions: suggestions.iter().map(|m| m.notation.clone()).collect(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveVerdict {
    TopMove,
    NotTopMove,
    Unanalysed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAnnotation {
    /// 1-based half-move number.
    pub ply: usize,
    pub san: String,
    pub color: PieceColor,
    pub verdict: MoveVerdict,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Evaluation, Position};

    fn top(notation: &str, cp: i32) -> TopMove {
        TopMove {
            notation: notation.to_string(),
            evaluation: Evaluation::Centipawns(cp),
            principal_variation: vec![],
        }
    }

    #[test]
    fn test_ranked_slots_are_sparse() {
        let mut ranked = RankedTopMoves::new();
        assert!(ranked.is_empty());

        ranked.insert(3, top("c4", 10));
        assert!(ranked.best().is_none());
        assert_eq!(ranked.get(3).map(|m| m.notation.as_str()), Some("c4"));

        ranked.insert(1, top("e4", 30));
        ranked.insert(1, top("d4", 35));
        let ranks: Vec<(u32, &str)> = ranked.iter().map(|(r, m)| (r, m.notation.as_str())).collect();
        assert_eq!(ranks, vec![(1, "d4"), (3, "c4")]);
        assert!(ranked.get(0).is_none());
        assert_eq!(ranked.to_vec().len(), 2);

        ranked.clear();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_beyond_multipv_limit_is_dropped() {
        let mut ranked = RankedTopMoves::new();
        assert!(!ranked.insert(4_000_000_000, top("e4", 30)));
        assert!(!ranked.insert(MAX_MULTIPV + 1, top("e4", 30)));
        assert!(ranked.is_empty());

        assert!(ranked.insert(MAX_MULTIPV, top("a3", -40)));
        assert_eq!(ranked.iter().count(), 1);
    }

    #[test]
    fn test_merge_replaces_same_notation() {
        let key = Position::startpos().key();
        let mut store = PositionTopMoves::new();
        store.merge(key.clone(), top("e4", 20));
        store.merge(key.clone(), top("d4", 15));
        store.merge(key.clone(), top("e4", 31));

        let moves = store.get(&key);
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0], top("e4", 31));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_transposed_positions_share_suggestions() {
        let a = Game::from_sans(&["Nf3", "Nf6", "Nc3"]).unwrap();
        let b = Game::from_sans(&["Nc3", "Nf6", "Nf3"]).unwrap();
        let mut store = PositionTopMoves::new();
        store.merge(a.position().key(), top("d5", -10));
        assert_eq!(store.get(&b.position().key()).len(), 1);
    }

    #[test]
    fn test_annotate_marks_played_moves() {
        let game = Game::from_sans(&["e4", "e5", "Nf3"]).unwrap();
        let mut store = PositionTopMoves::new();
        store.merge(game.key_at(0).unwrap(), top("e4", 30));
        store.merge(game.key_at(0).unwrap(), top("d4", 25));
        store.merge(game.key_at(1).unwrap(), top("c5", 30));

        let annotations = store.annotate(&game);
        let verdicts: Vec<MoveVerdict> = annotations.iter().map(|a| a.verdict).collect();
        assert_eq!(
            verdicts,
            vec![MoveVerdict::TopMove, MoveVerdict::NotTopMove, MoveVerdict::Unanalysed]
        );
        assert_eq!(annotations[0].suggestions, vec!["e4", "d4"]);
        assert_eq!(annotations[1].color, PieceColor::Black);
        assert_eq!(annotations[2].ply, 3);
    }

    #[test]
    fn test_store_serializes_by_key() {
        let key = Position::startpos().key();
        let mut store = PositionTopMoves::new();
        store.merge(key.clone(), top("e4", 20));
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json[key.as_str()][0]["move"], "e4");
    }
}

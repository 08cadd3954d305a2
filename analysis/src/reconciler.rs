//! Turns one ranked engine line into a [`TopMove`] for the tracked position.
//!
//! The engine reports coordinate moves. Before they can be shown in SAN they
//! are replayed on a scratch copy of the game position. Occasionally the
//! reported line starts with a move for the side that is *not* to move in
//! the tracked position; [`find_bridging_move`] handles the common case of
//! that with a best-effort heuristic.

use chess::{origin_rank_char, Evaluation, PieceColor, Position, PositionKey};
use engine::{ScoreKind, ScoreUpdate};
use serde::{Deserialize, Serialize};

/// Number of principal-variation moves kept on a [`TopMove`].
pub const TOP_MOVE_PV_LEN: usize = 3;

/// How the engine's score sign is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScorePerspective {
    /// Scores already favour White when positive.
    #[default]
    WhiteRelative,
    /// Scores favour the side to move (the UCI convention); negated when
    /// Black is to move.
    SideToMove,
}

impl ScorePerspective {
    pub fn normalize(self, score: Evaluation, side_to_move: PieceColor) -> Evaluation {
        match self {
            Self::WhiteRelative => score,
            Self::SideToMove => Evaluation::from_side_to_move(score, side_to_move),
        }
    }
}

/// Which move, if any, is played before the reported move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgingPolicy {
    /// With White to move and a reported move leaving rank 7, play the first
    /// other line move leaving rank 2. Only that one candidate is tried. It
    /// relies on rank digits alone, so it assumes pawns and pieces still
    /// stand roughly where the standard setup puts them.
    #[default]
    FirstSecondRankOrigin,
    Disabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub perspective: ScorePerspective,
    pub bridging: BridgingPolicy,
}

/// An engine suggestion for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopMove {
    /// SAN when the move could be replayed, the raw coordinate move otherwise.
    #[serde(rename = "move")]
    pub notation: String,
    pub evaluation: Evaluation,
    pub principal_variation: Vec<String>,
}

/// Outcome of reconciling one engine line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub rank: u32,
    /// Key of the tracked position the line was searched from.
    pub key: PositionKey,
    pub top_move: TopMove,
    /// Coordinate move played before the reported move, if any.
    pub bridge: Option<String>,
    /// Set when something had to be recovered from.
    pub diagnostic: Option<String>,
    /// Whether the notation is SAN rather than the raw fallback.
    pub converted: bool,
}

/// The bridging candidate for `target`, according to `policy`.
pub fn find_bridging_move<'a>(
    position: &Position,
    target: &str,
    pv: &'a [String],
    policy: BridgingPolicy,
) -> Option<&'a str> {
    match policy {
        BridgingPolicy::Disabled => None,
        BridgingPolicy::FirstSecondRankOrigin => {
            if !position.is_white_to_move() || origin_rank_char(target) != Some('7') {
                return None;
            }
            pv.iter()
                .map(String::as_str)
                .find(|mv| *mv != target && origin_rank_char(mv) == Some('2'))
        }
    }
}

fn raw_evaluation(update: &ScoreUpdate) -> Evaluation {
    match update.kind {
        ScoreKind::Centipawns => Evaluation::Centipawns(update.value),
        ScoreKind::Mate => Evaluation::Mate(update.value),
    }
}

/// Reconcile one ranked engine line against the tracked position.
///
/// Never fails: an unplayable move is kept in raw coordinate form with an
/// empty principal variation, and the evaluation is still reported.
pub fn reconcile(
    update: &ScoreUpdate,
    position: &Position,
    config: &ReconcilerConfig,
) -> Reconciliation {
    let evaluation = config
        .perspective
        .normalize(raw_evaluation(update), position.side_to_move());
    let mut diagnostic = None;

    let mut scratch = position.clone();
    let mut bridge = find_bridging_move(position, &update.mv, &update.pv, config.bridging)
        .map(str::to_string);
    if let Some(bridge_move) = &bridge {
        match scratch.play_uci(bridge_move) {
            Ok(_) => tracing::debug!(bridge = %bridge_move, target = %update.mv, "Applied bridging move"),
            Err(e) => {
                diagnostic = Some(format!("bridging move {} not playable: {}", bridge_move, e));
                scratch = position.clone();
            }
        }
    }
    if diagnostic.is_some() {
        bridge = None;
    }

    let (top_move, converted) = match scratch.play_uci(&update.mv) {
        Ok(played) => (
            TopMove {
                notation: played.san,
                evaluation,
                principal_variation: update.pv.iter().take(TOP_MOVE_PV_LEN).cloned().collect(),
            },
            true,
        ),
        Err(e) => {
            tracing::warn!(rank = update.rank, mv = %update.mv, "Keeping raw engine move: {}", e);
            let note = format!("{} not playable: {}", update.mv, e);
            diagnostic = Some(match diagnostic {
                Some(earlier) => format!("{}; {}", earlier, note),
                None => note,
            });
            (
                TopMove {
                    notation: update.mv.clone(),
                    evaluation,
                    principal_variation: Vec::new(),
                },
                false,
            )
        }
    };

    Reconciliation {
        rank: update.rank,
        key: position.key(),
        top_move,
        bridge,
        diagnostic,
        converted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(rank: u32, kind: ScoreKind, value: i32, pv: &[&str]) -> ScoreUpdate {
        ScoreUpdate {
            depth: 12,
            rank,
            kind,
            value,
            mv: pv[0].to_string(),
            pv: pv.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn after(uci: &[&str]) -> Position {
        let mut position = Position::startpos();
        for mv in uci {
            position.play_uci(mv).unwrap();
        }
        position
    }

    #[test]
    fn test_pv_is_truncated() {
        let line = update(2, ScoreKind::Centipawns, 10, &["d2d4", "d7d5", "c2c4", "e7e6"]);
        let result = reconcile(&line, &Position::startpos(), &ReconcilerConfig::default());
        assert_eq!(result.rank, 2);
        assert_eq!(result.top_move.notation, "d4");
        assert_eq!(result.top_move.principal_variation, ["d2d4", "d7d5", "c2c4"]);
        assert!(result.converted);
        assert!(result.diagnostic.is_none());
    }

    #[test]
    fn test_side_to_move_perspective_negates_for_black() {
        let config = ReconcilerConfig {
            perspective: ScorePerspective::SideToMove,
            ..Default::default()
        };
        let line = update(1, ScoreKind::Centipawns, 30, &["e7e5"]);
        let result = reconcile(&line, &after(&["e2e4"]), &config);
        assert_eq!(result.top_move.evaluation, Evaluation::Centipawns(-30));

        let line = update(1, ScoreKind::Mate, 2, &["d2d4"]);
        let result = reconcile(&line, &Position::startpos(), &config);
        assert_eq!(result.top_move.evaluation, Evaluation::Mate(2));
    }

    #[test]
    fn test_bridging_candidate_selection() {
        let pv: Vec<String> = ["e7e5", "g1f3", "d2d4", "b8c6"]
            .iter()
            .map(|m| m.to_string())
            .collect();
        let start = Position::startpos();
        let policy = BridgingPolicy::FirstSecondRankOrigin;

        assert_eq!(find_bridging_move(&start, "e7e5", &pv, policy), Some("d2d4"));
        // Only a rank-7 origin triggers it.
        assert_eq!(find_bridging_move(&start, "g1f3", &pv, policy), None);
        assert_eq!(
            find_bridging_move(&start, "e7e5", &pv, BridgingPolicy::Disabled),
            None
        );
        // Black to move: never.
        assert_eq!(find_bridging_move(&after(&["e2e4"]), "e7e5", &pv, policy), None);
    }

    #[test]
    fn test_bridge_is_applied_before_target() {
        let line = update(1, ScoreKind::Centipawns, 15, &["d7d5", "c2c4"]);
        let result = reconcile(&line, &Position::startpos(), &ReconcilerConfig::default());
        assert_eq!(result.bridge.as_deref(), Some("c2c4"));
        assert_eq!(result.top_move.notation, "d5");
        assert_eq!(result.key, Position::startpos().key());
        assert!(result.converted);
    }

    #[test]
    fn test_unplayable_bridge_is_dropped() {
        // c2c5 is not a legal first move, so d7d5 is tried directly and fails.
        let line = update(1, ScoreKind::Centipawns, 0, &["d7d5", "c2c5"]);
        let result = reconcile(&line, &Position::startpos(), &ReconcilerConfig::default());
        assert!(result.bridge.is_none());
        assert!(!result.converted);
        assert_eq!(result.top_move.notation, "d7d5");
        assert!(result.top_move.principal_variation.is_empty());
        let diagnostic = result.diagnostic.unwrap();
        assert!(diagnostic.contains("c2c5"));
        assert!(diagnostic.contains("d7d5"));
    }

    #[test]
    fn test_mate_score_is_kept_as_moves() {
        let position = after(&["f2f3", "e7e5", "g2g4"]);
        let line = update(1, ScoreKind::Mate, -1, &["d8h4"]);
        let result = reconcile(&line, &position, &ReconcilerConfig::default());
        assert_eq!(result.top_move.notation, "Qh4#");
        assert_eq!(result.top_move.evaluation, Evaluation::Mate(-1));
        assert_eq!(result.top_move.evaluation.display(), "-M1");
    }

    #[test]
    fn test_top_move_json_shape() {
        let line = update(1, ScoreKind::Centipawns, 35, &["e2e4", "e7e5"]);
        let result = reconcile(&line, &Position::startpos(), &ReconcilerConfig::default());
        let json = serde_json::to_value(&result.top_move).unwrap();
        assert_eq!(json["move"], "e4");
        assert_eq!(json["principalVariation"][1], "e7e5");
        assert_eq!(json["evaluation"]["kind"], "pawns");
        assert_eq!(json["evaluation"]["value"], 0.35);
    }
}

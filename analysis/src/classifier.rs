//! Opening and defense classification by exact move-prefix matching.

use std::sync::Arc;

use chess::{parse_pgn, Game, GameError, PgnError, Position, PositionKey};
use serde::{Deserialize, Serialize};

use crate::corpus::{Corpus, CorpusError, OpeningEntry};

/// Prefixes longer than this many moves are not examined.
pub const MAX_PREFIX_MOVES: usize = 8;

/// White openings matching the game after White's `move_number`-th move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMatch {
    pub move_number: usize,
    pub position: PositionKey,
    pub matched_openings: Vec<String>,
    pub total_matching_openings: usize,
}

/// Black defenses matching the first `move_number` full moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseMatch {
    pub move_number: usize,
    pub position: PositionKey,
    pub matched_defenses: Vec<String>,
    pub total_matching_defenses: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningAnalysis {
    pub matched_opening: Option<String>,
    pub matched_black_defense: Option<String>,
    pub position_matches: Vec<PositionMatch>,
    pub black_defense_matches: Vec<DefenseMatch>,
}

/// Matches games against the two corpora.
///
/// The reported opening (or defense) is the first corpus entry that matches
/// the longest examined prefix, in corpus order. It is not necessarily the
/// most specific entry.
///
/// Corpus lines start from the standard position, so a game set up from any
/// other position matches nothing.
#[derive(Debug, Clone)]
pub struct OpeningClassifier {
    openings: Arc<Corpus>,
    defenses: Arc<Corpus>,
}

impl OpeningClassifier {
    pub fn new(openings: Arc<Corpus>, defenses: Arc<Corpus>) -> Self {
        Self {
            openings,
            defenses,
        }
    }

    /// Classifier over the bundled corpora.
    pub fn builtin() -> Result<Self, CorpusError> {
        Ok(Self::new(
            Corpus::builtin_openings()?,
            Corpus::builtin_defenses()?,
        ))
    }

    pub fn openings(&self) -> &Corpus {
        &self.openings
    }

    pub fn defenses(&self) -> &Corpus {
        &self.defenses
    }

    pub fn classify(&self, game: &Game) -> OpeningAnalysis {
        if game.key_at(0) != Some(Position::startpos().key()) {
            tracing::debug!(plies = game.len(), "Skipping game set up from a custom position");
            return OpeningAnalysis::default();
        }

        let moves = game.sans();
        let white_moves: Vec<String> = moves.iter().step_by(2).cloned().collect();
        let mut analysis = OpeningAnalysis::default();

        for n in 1..=white_moves.len().min(MAX_PREFIX_MOVES) {
            let matched = matching_names(self.openings.entries(), &white_moves[..n], |entry| {
                entry.white_moves()
            });
            // After White's n-th move.
            let Some(position) = game.key_at(2 * n - 1) else {
                break;
            };

            if let Some(first) = matched.first() {
                analysis.matched_opening = Some(first.clone());
            }
            analysis.position_matches.push(PositionMatch {
                move_number: n,
                position,
                total_matching_openings: matched.len(),
                matched_openings: matched,
            });
        }

        for n in 1..=(moves.len() / 2).min(MAX_PREFIX_MOVES) {
            let matched = matching_names(self.defenses.entries(), &moves[..2 * n], |entry| {
                entry.moves()
            });
            let Some(position) = game.key_at(2 * n) else {
                break;
            };

            if let Some(first) = matched.first() {
                analysis.matched_black_defense = Some(first.clone());
            }
            analysis.black_defense_matches.push(DefenseMatch {
                move_number: n,
                position,
                total_matching_defenses: matched.len(),
                matched_defenses: matched,
            });
        }

        tracing::debug!(
            plies = game.len(),
            opening = ?analysis.matched_opening,
            defense = ?analysis.matched_black_defense,
            "Classified game"
        );
        analysis
    }

    /// Replay SAN moves from the standard start and classify them.
    pub fn classify_moves<S: AsRef<str>>(&self, sans: &[S]) -> Result<OpeningAnalysis, GameError> {
        Ok(self.classify(&Game::from_sans(sans)?))
    }

    pub fn classify_pgn(&self, pgn: &str) -> Result<OpeningAnalysis, PgnError> {
        Ok(self.classify(&parse_pgn(pgn)?.game))
    }
}

/// Names of entries whose sequence starts with `prefix`, in corpus order.
/// Entries shorter than the prefix never match.
fn matching_names<'a>(
    entries: &'a [OpeningEntry],
    prefix: &[String],
    sequence: impl Fn(&'a OpeningEntry) -> &'a [String],
) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| sequence(*entry).starts_with(prefix))
        .map(|entry| entry.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> OpeningClassifier {
        let openings = Corpus::new(vec![
            OpeningEntry::new("King's Pawn", "e4"),
            OpeningEntry::new("Italian Game", "e4 e5 Nf3 Nc6 Bc4"),
            OpeningEntry::new("Ruy Lopez", "e4 e5 Nf3 Nc6 Bb5"),
            OpeningEntry::new("Queen's Gambit", "d4 d5 c4"),
        ]);
        let defenses = Corpus::new(vec![
            OpeningEntry::new("Open Game", "e4 e5"),
            OpeningEntry::new("Petrov's Defense", "e4 e5 Nf3 Nf6"),
        ]);
        OpeningClassifier::new(Arc::new(openings), Arc::new(defenses))
    }

    #[test]
    fn test_first_match_in_corpus_order() {
        let analysis = classifier()
            .classify_moves(&["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"])
            .unwrap();
        assert_eq!(analysis.matched_opening.as_deref(), Some("Ruy Lopez"));

        // After 1.e4 the shorter entry is listed first and wins.
        assert_eq!(
            analysis.position_matches[0].matched_openings,
            vec!["King's Pawn", "Italian Game", "Ruy Lopez"]
        );
        assert_eq!(
            analysis.position_matches[1].matched_openings,
            vec!["Italian Game", "Ruy Lopez"]
        );
        assert_eq!(analysis.position_matches[2].total_matching_openings, 1);
    }

    #[test]
    fn test_name_survives_when_longer_prefixes_stop_matching() {
        let analysis = classifier()
            .classify_moves(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6", "d4"])
            .unwrap();
        assert_eq!(analysis.position_matches.len(), 5);
        assert!(analysis.position_matches[3].matched_openings.is_empty());
        assert!(analysis.position_matches[4].matched_openings.is_empty());
        assert_eq!(analysis.matched_opening.as_deref(), Some("Italian Game"));
    }

    #[test]
    fn test_defense_uses_full_sequence() {
        let analysis = classifier()
            .classify_moves(&["e4", "e5", "Nf3", "Nf6", "Nxe5"])
            .unwrap();
        assert_eq!(analysis.black_defense_matches.len(), 2);
        assert_eq!(
            analysis.black_defense_matches[0].matched_defenses,
            vec!["Open Game", "Petrov's Defense"]
        );
        assert_eq!(
            analysis.matched_black_defense.as_deref(),
            Some("Petrov's Defense")
        );
    }

    #[test]
    fn test_single_white_move_has_no_defense_entries() {
        let analysis = classifier().classify_moves(&["e4"]).unwrap();
        assert_eq!(analysis.position_matches.len(), 1);
        assert!(analysis.black_defense_matches.is_empty());
        assert!(analysis.matched_black_defense.is_none());
    }

    #[test]
    fn test_prefixes_stop_at_eight_moves() {
        let moves = [
            "Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8",
            "Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8",
        ];
        let analysis = classifier().classify_moves(&moves).unwrap();
        assert_eq!(analysis.position_matches.len(), MAX_PREFIX_MOVES);
        assert_eq!(analysis.black_defense_matches.len(), MAX_PREFIX_MOVES);
        assert!(analysis.matched_opening.is_none());
    }

    #[test]
    fn test_serializes_camel_case() {
        let analysis = classifier().classify_moves(&["d4", "d5", "c4"]).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["matchedOpening"], "Queen's Gambit");
        assert_eq!(json["positionMatches"][1]["moveNumber"], 2);
        assert_eq!(json["positionMatches"][1]["totalMatchingOpenings"], 1);
        assert!(json["matchedBlackDefense"].is_null());
    }

    #[test]
    fn test_custom_start_position_matches_nothing() {
        let pgn = "[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1\"]\n\n\
                   1... e5 2. Nf3 Nf6 *";
        let analysis = classifier().classify_pgn(pgn).unwrap();
        assert_eq!(analysis, OpeningAnalysis::default());

        // A FEN tag holding the standard start is an ordinary game.
        let pgn = format!("[FEN \"{}\"]\n\n1. e4 e5 2. Nf3 Nf6 *", chess::STARTING_FEN);
        let analysis = classifier().classify_pgn(&pgn).unwrap();
        assert_eq!(
            analysis.matched_black_defense.as_deref(),
            Some("Petrov's Defense")
        );
        assert_eq!(analysis.position_matches.len(), 2);
    }

    #[test]
    fn test_classify_pgn() {
        let analysis = classifier()
            .classify_pgn("[Event \"Casual\"]\n\n1. d4 d5 2. c4 e6 *")
            .unwrap();
        assert_eq!(analysis.matched_opening.as_deref(), Some("Queen's Gambit"));
        assert!(classifier().classify_pgn("1. e4 Ke7 Ke5").is_err());
    }
}

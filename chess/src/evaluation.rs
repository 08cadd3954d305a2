//! Engine evaluation scores.

use serde::{Deserialize, Serialize};

use crate::types::PieceColor;

/// Engine evaluation, always stored from White's point of view.
///
/// Centipawns: positive = White is better.
/// Mate: positive N = White mates in N moves, negative N = Black mates in N.
///
/// Serialized in pawns, e.g. `{"kind":"pawns","value":0.35}` or
/// `{"kind":"mate","value":-3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EvaluationRepr", from = "EvaluationRepr")]
pub enum Evaluation {
    Centipawns(i32),
    Mate(i32),
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
enum EvaluationRepr {
    Pawns(f64),
    Mate(i32),
}

impl From<Evaluation> for EvaluationRepr {
    fn from(eval: Evaluation) -> Self {
        match eval {
            Evaluation::Centipawns(_) => Self::Pawns(eval.value()),
            Evaluation::Mate(m) => Self::Mate(m),
        }
    }
}

impl From<EvaluationRepr> for Evaluation {
    fn from(repr: EvaluationRepr) -> Self {
        match repr {
            EvaluationRepr::Pawns(pawns) => Self::Centipawns((pawns * 100.0).round() as i32),
            EvaluationRepr::Mate(m) => Self::Mate(m),
        }
    }
}

impl Evaluation {
    /// Signed number shown next to a move: pawns for centipawn scores,
    /// moves-to-mate for mate scores.
    pub fn value(&self) -> f64 {
        match self {
            Self::Centipawns(cp) => *cp as f64 / 100.0,
            Self::Mate(m) => *m as f64,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.1}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m >= 0 {
                    format!("M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    /// Re-express a side-to-move-relative score from White's side.
    pub fn from_side_to_move(score: Self, side_to_move: PieceColor) -> Self {
        match side_to_move {
            PieceColor::White => score,
            PieceColor::Black => score.negate(),
        }
    }
}

impl std::fmt::Display for Evaluation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_in_pawns() {
        assert_eq!(Evaluation::Centipawns(35).value(), 0.35);
        assert_eq!(Evaluation::Centipawns(-20).value(), -0.2);
        assert_eq!(Evaluation::Mate(-3).value(), -3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Evaluation::Centipawns(40).to_string(), "+0.4");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.2");
        assert_eq!(Evaluation::Centipawns(0).to_string(), "+0.0");
        assert_eq!(Evaluation::Mate(3).to_string(), "M3");
        assert_eq!(Evaluation::Mate(-2).to_string(), "-M2");
    }

    #[test]
    fn test_side_to_move_normalisation() {
        let black_view = Evaluation::Centipawns(50);
        assert_eq!(
            Evaluation::from_side_to_move(black_view, PieceColor::Black),
            Evaluation::Centipawns(-50)
        );
        assert_eq!(
            Evaluation::from_side_to_move(black_view, PieceColor::White),
            black_view
        );
    }

    #[test]
    fn test_json_is_in_pawns() {
        let json = serde_json::to_value(Evaluation::Centipawns(35)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "pawns", "value": 0.35}));
        let json = serde_json::to_value(Evaluation::Mate(-3)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "mate", "value": -3}));

        let back: Evaluation = serde_json::from_str(r#"{"kind":"pawns","value":-1.2}"#).unwrap();
        assert_eq!(back, Evaluation::Centipawns(-120));
    }
}

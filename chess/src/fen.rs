use cozy_chess::Board;
use serde::{Deserialize, Serialize};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Number of FEN fields that take part in a position's identity: placement,
/// side to move, castling rights and en-passant target. The move counters
/// depend on how the position was reached and are left out.
const KEY_FIELDS: usize = 4;

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < KEY_FIELDS {
        return Err(FenError::InvalidFormat(fen.to_string()));
    }

    if parts[0].split('/').count() != 8 {
        return Err(FenError::InvalidBoardLayout(parts[0].to_string()));
    }

    // Positions pasted without move counters are still usable.
    let completed;
    let fen = if parts.len() == KEY_FIELDS {
        completed = format!("{} 0 1", parts.join(" "));
        completed.as_str()
    } else {
        fen
    };

    Board::from_fen(fen, false).map_err(|_| FenError::InvalidFormat(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

/// Canonical identity of a position, used as a map key for per-position
/// annotations. Two positions with the same key are interchangeable no matter
/// which move order produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionKey(String);

impl PositionKey {
    pub fn from_board(board: &Board) -> Self {
        Self::from_fen(&format_fen(board))
    }

    /// Build a key from any FEN by dropping the move counters.
    pub fn from_fen(fen: &str) -> Self {
        let fields: Vec<&str> = fen.split_whitespace().take(KEY_FIELDS).collect();
        Self(fields.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid board layout: {0}")]
    InvalidBoardLayout(String),
}

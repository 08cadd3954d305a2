use crate::fen::{FenError, PositionKey};
use crate::pgn::SanError;
use crate::position::{PlayedMove, Position};
use crate::uci::UciMoveError;

/// A game: a start position plus the moves played from it. Every
/// intermediate position can be rebuilt from this.
#[derive(Debug, Clone)]
pub struct Game {
    start: Position,
    position: Position,
    history: Vec<PlayedMove>,
    start_position: StartPosition,
}

/// Starting position of the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            start: Position::startpos(),
            position: Position::startpos(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let start = Position::from_fen(fen)?;
        Ok(Self {
            position: start.clone(),
            start,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.to_string()),
        })
    }

    /// Replay a list of SAN moves from the standard start.
    pub fn from_sans<S: AsRef<str>>(sans: &[S]) -> Result<Self, GameError> {
        let mut game = Self::new();
        for san in sans {
            game.play_san(san.as_ref())?;
        }
        Ok(game)
    }

    /// The current (final) position
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// The moves played so far
    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn play_san(&mut self, san: &str) -> Result<&PlayedMove, GameError> {
        let played = self.position.play_san(san)?;
        Ok(self.push(played))
    }

    pub fn play_uci(&mut self, uci: &str) -> Result<&PlayedMove, GameError> {
        let played = self.position.play_uci(uci)?;
        Ok(self.push(played))
    }

    fn push(&mut self, played: PlayedMove) -> &PlayedMove {
        self.history.push(played);
        &self.history[self.history.len() - 1]
    }

    /// SAN of every move, in order.
    pub fn sans(&self) -> Vec<String> {
        self.history.iter().map(|m| m.san.clone()).collect()
    }

    /// Coordinate form of every move, as sent after `position startpos moves`.
    pub fn uci_moves(&self) -> Vec<String> {
        self.history.iter().map(|m| m.uci.clone()).collect()
    }

    /// Position after the first `ply` half-moves (0 = start position).
    pub fn position_at(&self, ply: usize) -> Result<Position, GameError> {
        if ply > self.history.len() {
            return Err(GameError::PlyOutOfRange {
                ply,
                len: self.history.len(),
            });
        }

        let mut position = self.start.clone();
        for played in &self.history[..ply] {
            position.play_uci(&played.uci)?;
        }
        Ok(position)
    }

    /// Canonical key of the position after the first `ply` half-moves.
    pub fn key_at(&self, ply: usize) -> Option<PositionKey> {
        match ply {
            0 => Some(self.start.key()),
            n => self.history.get(n - 1).map(|m| m.key_after.clone()),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Ply {ply} is beyond the game length {len}")]
    PlyOutOfRange { ply: usize, len: usize },
    #[error("FEN parse error: {0}")]
    Fen(#[from] FenError),
    #[error("SAN error: {0}")]
    San(#[from] SanError),
    #[error("UCI move error: {0}")]
    Uci(#[from] UciMoveError),
}

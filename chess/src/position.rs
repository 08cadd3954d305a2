use cozy_chess::{Board, Color, Move};
use serde::{Deserialize, Serialize};

use crate::fen::{format_fen, parse_fen, PositionKey};
use crate::game::GameError;
use crate::pgn::san::{format_san, legal_moves, parse_san};
use crate::types::PieceColor;
use crate::uci::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move};

/// A board state with legal-move generation and notation, wrapping a
/// cozy-chess [`Board`].
#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

/// A move applied to a specific position, with the notation derived from
/// that position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    pub san: String,
    pub uci: String,
    pub color: PieceColor,
    pub key_before: PositionKey,
    pub key_after: PositionKey,
}

impl Position {
    pub fn startpos() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self {
            board: parse_fen(fen)?,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        format_fen(&self.board)
    }

    pub fn key(&self) -> PositionKey {
        PositionKey::from_board(&self.board)
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    /// Apply a move given in any encoding cozy-chess or UCI uses for it.
    pub fn play(&mut self, mv: Move) -> Result<PlayedMove, GameError> {
        let legal = self.legal_moves();
        let mv = convert_uci_castling_to_cozy(mv, &legal);
        if !legal.contains(&mv) {
            return Err(GameError::IllegalMove(format_uci_move(&self.board, mv)));
        }

        let color = self.board.side_to_move();
        let san = format_san(&self.board, mv)?;
        let uci = format_uci_move(&self.board, mv);
        let key_before = self.key();

        self.board.play_unchecked(mv);

        Ok(PlayedMove {
            san,
            uci,
            color: color.into(),
            key_before,
            key_after: self.key(),
        })
    }

    /// Apply a coordinate move such as `e2e4`, `e7e8q` or `e1g1`.
    pub fn play_uci(&mut self, uci: &str) -> Result<PlayedMove, GameError> {
        let mv = parse_uci_move(uci)?;
        self.play(mv)
    }

    /// Apply a move written in SAN.
    pub fn play_san(&mut self, san: &str) -> Result<PlayedMove, GameError> {
        let mv = parse_san(&self.board, san)?;
        self.play(mv)
    }

    pub fn is_white_to_move(&self) -> bool {
        self.board.side_to_move() == Color::White
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

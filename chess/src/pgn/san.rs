//! Standard Algebraic Notation.
//!
//! Output follows the common PGN export conventions: piece letter, the
//! minimum file/rank disambiguation, `x` for captures (en passant included),
//! `=Q` for promotions, `O-O`/`O-O-O` for castling and a trailing `+` or `#`.
//! Corpus matching compares these strings byte for byte, so the format must
//! not drift.

use cozy_chess::{Board, Move, Piece};

use crate::uci::{file_char, is_castling, rank_char};

/// Format a legal move as SAN, relative to the position it is played from.
pub fn format_san(board: &Board, mv: Move) -> Result<String, SanError> {
    let legal = legal_moves(board);
    if !legal.contains(&mv) {
        return Err(SanError::NoLegalMove(crate::uci::format_uci_move(board, mv)));
    }

    let mut san = format_san_body(board, mv, &legal);

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if legal_moves(&after).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    Ok(san)
}

/// Parse a SAN token against `board`, returning the matching legal move.
///
/// Check, mate and annotation suffixes (`+ # ! ?`) are ignored, and `0-0`
/// is accepted for `O-O`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = legal_moves(board);
    let mut found = legal
        .iter()
        .copied()
        .filter(|&mv| {
            let body = format_san_body(board, mv, &legal);
            body == wanted || body.replace('=', "") == wanted
        });

    match (found.next(), found.next()) {
        (Some(mv), None) => Ok(mv),
        (Some(_), Some(_)) => Err(SanError::AmbiguousMove(san.to_string())),
        (None, _) => Err(SanError::NoLegalMove(san.to_string())),
    }
}

fn normalize(san: &str) -> String {
    let trimmed = san.trim().trim_end_matches(['+', '#', '!', '?']);
    match trimmed {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}

/// SAN without the check/mate suffix.
fn format_san_body(board: &Board, mv: Move, legal: &[Move]) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return String::new();
    };

    if is_castling(board, mv) {
        return if mv.to.file() as u8 > mv.from.file() as u8 {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let is_capture = board.color_on(mv.to) == Some(!board.side_to_move())
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut san = String::new();

    match piece {
        Piece::Pawn => {
            if is_capture {
                san.push(file_char(mv.from.file()));
            }
        }
        _ => {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(board, mv, piece, legal));
        }
    }

    if is_capture {
        san.push('x');
    }

    san.push(file_char(mv.to.file()));
    san.push(rank_char(mv.to.rank()));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(piece_letter(promo));
    }

    san
}

/// Minimal origin qualifier: file if it is unique among the rivals, else
/// rank, else both.
fn disambiguation(board: &Board, mv: Move, piece: Piece, legal: &[Move]) -> String {
    if piece == Piece::King {
        return String::new();
    }

    let rivals: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file_unique = rivals.iter().all(|o| o.from.file() != mv.from.file());
    let rank_unique = rivals.iter().all(|o| o.from.rank() != mv.from.rank());

    if file_unique {
        file_char(mv.from.file()).to_string()
    } else if rank_unique {
        rank_char(mv.from.rank()).to_string()
    } else {
        format!("{}{}", file_char(mv.from.file()), rank_char(mv.from.rank()))
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub(crate) fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

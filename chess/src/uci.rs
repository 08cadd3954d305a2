//! UCI (Universal Chess Interface) coordinate moves

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Parse UCI move format (e2e4, e7e8q)
///
/// Castling comes back in UCI form (e1g1); use [`convert_uci_castling_to_cozy`]
/// before handing it to a board.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        Some(letter) => Some(parse_promotion(letter).ok_or_else(|| {
            UciMoveError::InvalidPromotion(s.to_string())
        })?),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Rank digit of a coordinate move's origin square ('2' for "e2e4").
pub fn origin_rank_char(uci: &str) -> Option<char> {
    uci.chars().nth(1)
}

fn parse_promotion(letter: &str) -> Option<Piece> {
    match letter {
        "q" => Some(Piece::Queen),
        "r" => Some(Piece::Rook),
        "b" => Some(Piece::Bishop),
        "n" => Some(Piece::Knight),
        _ => None,
    }
}

pub fn parse_square(s: &str) -> Result<Square, UciMoveError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(UciMoveError::InvalidSquare(s.to_string()));
    };

    let file = match f {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    let rank = match r {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return Err(UciMoveError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The conversion only happens when the king-to-rook form is among
/// `legal_moves`; anything else is returned untouched.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);

    if !is_back_rank || !is_e_file || mv.promotion.is_some() || mv.from.rank() != mv.to.rank() {
        return mv;
    }

    let rook_file = match mv.to.file() {
        File::G => File::H,
        File::C => File::A,
        _ => return mv,
    };

    let converted = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };

    if legal_moves.contains(&converted) {
        converted
    } else {
        mv
    }
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q").
///
/// `board` is the position the move is played from; castling is written the
/// way engines expect it (e1g1) rather than cozy_chess's king-takes-rook form.
pub fn format_uci_move(board: &Board, mv: Move) -> String {
    let to = if is_castling(board, mv) {
        let file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        Square::new(file, mv.from.rank())
    } else {
        mv.to
    };

    let mut s = format!("{}{}", format_square(mv.from), format_square(to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// A king landing on its own rook is cozy_chess's castling encoding.
pub(crate) fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.piece_on(mv.to) == Some(Piece::Rook)
        && board.color_on(mv.from) == board.color_on(mv.to)
}

pub fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

pub(crate) fn file_char(file: File) -> char {
    match file {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    }
}

pub(crate) fn rank_char(rank: Rank) -> char {
    match rank {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    }
}

fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uci_move() {
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(mv.from, Square::new(File::E, Rank::Second));
        assert_eq!(mv.to, Square::new(File::E, Rank::Fourth));
        assert_eq!(mv.promotion, None);
    }

    #[test]
    fn test_parse_uci_move_with_promotion() {
        let mv = parse_uci_move("e7e8q").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
    }

    #[test]
    fn test_parse_uci_move_rejects_junk() {
        assert!(parse_uci_move("(none)").is_err());
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("e2e9").is_err());
        assert!(matches!(
            parse_uci_move("e7e8k"),
            Err(UciMoveError::InvalidPromotion(_))
        ));
    }

    #[test]
    fn test_format_uci_move() {
        let board = Board::default();
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(format_uci_move(&board, mv), "e2e4");
    }

    #[test]
    fn test_castling_conversion_roundtrip() {
        let board = Board::from_fen(
            "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1",
            false,
        )
        .unwrap();
        let mut legal = Vec::new();
        board.generate_moves(|mvs| {
            legal.extend(mvs);
            false
        });

        let uci = parse_uci_move("e1g1").unwrap();
        let cozy = convert_uci_castling_to_cozy(uci, &legal);
        assert_eq!(cozy.to, Square::new(File::H, Rank::First));
        assert_eq!(format_uci_move(&board, cozy), "e1g1");

        let long = convert_uci_castling_to_cozy(parse_uci_move("e1c1").unwrap(), &legal);
        assert_eq!(format_uci_move(&board, long), "e1c1");
    }

    #[test]
    fn test_non_castling_king_move_untouched() {
        let mv = parse_uci_move("e1f1").unwrap();
        assert_eq!(convert_uci_castling_to_cozy(mv, &[]), mv);
    }

    #[test]
    fn test_origin_rank_char() {
        assert_eq!(origin_rank_char("e7e5"), Some('7'));
        assert_eq!(origin_rank_char(""), None);
    }
}

//! Position and move model for chesslens.
//!
//! Wraps cozy-chess with the pieces the analysis layer needs: canonical
//! position keys, SAN in the usual PGN export style, UCI coordinate moves,
//! PGN movetext ingestion and White-relative evaluations.

pub mod evaluation;
pub mod fen;
pub mod game;
pub mod pgn;
pub mod position;
pub mod types;
pub mod uci;

pub use evaluation::Evaluation;
pub use fen::{FenError, PositionKey, STARTING_FEN};
pub use game::{Game, GameError, StartPosition};
pub use pgn::{parse_pgn, PgnError, PgnGame, SanError};
pub use position::{PlayedMove, Position};
pub use types::PieceColor;
pub use uci::{origin_rank_char, parse_uci_move, UciMoveError};

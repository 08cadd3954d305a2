pub mod parser;
pub mod san;

pub use parser::{parse_pgn, PgnError, PgnGame};
pub use san::{format_san, parse_san, SanError};

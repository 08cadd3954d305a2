pub mod command;
pub mod parser;

pub use command::{EngineCommand, EngineOptions, GoParams};
pub use parser::{parse_uci_line, MAX_MULTIPV, ScoreKind, ScoreUpdate, UciEvent};

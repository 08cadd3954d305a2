pub mod session;
pub mod stockfish;
pub mod uci;

pub use session::{EngineSession, SessionState};
pub use stockfish::{StockfishConfig, StockfishEngine};
pub use uci::{
    parse_uci_line, EngineCommand, MAX_MULTIPV, EngineOptions, GoParams, ScoreKind, ScoreUpdate, UciEvent,
};

use async_trait::async_trait;

/// Events delivered by an engine transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A parsed line of engine output.
    Uci(UciEvent),
    /// The transport broke (process exited, pipe error). Nothing follows.
    Failed(String),
}

/// A line-oriented channel to a UCI engine.
///
/// Implemented by [`StockfishEngine`]; tests drive the analysis layer with
/// scripted implementations.
#[async_trait]
pub trait UciTransport: Send {
    /// Queue a command for the engine.
    async fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineError>;

    /// Next event from the engine, or `None` once the transport is closed.
    async fn recv(&mut self) -> Option<EngineEvent>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine executable not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("Engine channel closed")]
    ChannelClosed,
    #[error("Cannot send {action} while the engine session is {state}")]
    InvalidState {
        state: &'static str,
        action: &'static str,
    },
    #[error("Engine session failed: {0}")]
    Failed(String),
}

//! Lifecycle of one engine session.
//!
//! ```text
//! Uninitialized --uci--> AwaitingReady --readyok--> Ready --go--> Searching
//!                                                     ^              |
//!                                                     |           bestmove
//!                                              go     v              v
//!                                  Searching <------- Idle <---------+
//! ```
//!
//! Each `go` is answered by exactly one `bestmove`, so a `go` sent while
//! searching keeps the session in `Searching` until every outstanding search
//! has reported.
//!
//! Any transport fault moves the session to `Failed`, which is terminal.

use crate::uci::{EngineCommand, UciEvent};
use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AwaitingReady,
    Ready,
    Searching,
    Idle,
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::AwaitingReady => "awaiting-ready",
            Self::Ready => "ready",
            Self::Searching => "searching",
            Self::Idle => "idle",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tracks the session state as commands go out and events come in.
#[derive(Debug, Clone)]
pub struct EngineSession {
    state: SessionState,
    /// `go` commands not yet answered by `bestmove`.
    outstanding: usize,
}

impl EngineSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            outstanding: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SessionState::Failed(_))
    }

    /// Whether a new search may be issued.
    pub fn can_search(&self) -> bool {
        matches!(
            self.state,
            SessionState::Ready | SessionState::Idle | SessionState::Searching
        )
    }

    /// Record a command about to be written to the engine.
    ///
    /// Rejects commands that make no sense in the current state; the caller
    /// must not send them.
    pub fn on_command(&mut self, cmd: &EngineCommand) -> Result<(), EngineError> {
        if let SessionState::Failed(reason) = &self.state {
            return Err(EngineError::Failed(reason.clone()));
        }

        match cmd {
            EngineCommand::Uci => match self.state {
                SessionState::Uninitialized => self.state = SessionState::AwaitingReady,
                _ => return Err(self.invalid("uci")),
            },
            EngineCommand::Go(_) => {
                if !self.can_search() {
                    return Err(self.invalid("go"));
                }
                // A go while searching supersedes the running search.
                self.outstanding += 1;
                self.state = SessionState::Searching;
            }
            EngineCommand::SetPosition { .. } | EngineCommand::IsReady => {
                if self.state == SessionState::Uninitialized {
                    return Err(self.invalid("position/isready"));
                }
            }
            EngineCommand::SetOption { .. } | EngineCommand::Stop | EngineCommand::Quit => {}
        }
        Ok(())
    }

    /// Advance on an event received from the engine.
    pub fn on_event(&mut self, event: &UciEvent) {
        let next = match (&self.state, event) {
            (SessionState::AwaitingReady, UciEvent::ReadyOk) => Some(SessionState::Ready),
            (SessionState::Searching, UciEvent::BestMove { .. }) => {
                self.outstanding = self.outstanding.saturating_sub(1);
                (self.outstanding == 0).then_some(SessionState::Idle)
            }
            _ => None,
        };

        if let Some(next) = next {
            tracing::debug!(from = %self.state, to = %next, "Engine session transition");
            self.state = next;
        }
    }

    /// Enter the terminal failed state.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(from = %self.state, %reason, "Engine session failed");
        self.state = SessionState::Failed(reason);
    }

    fn invalid(&self, action: &'static str) -> EngineError {
        EngineError::InvalidState {
            state: self.state.name(),
            action,
        }
    }
}

impl Default for EngineSession {
    fn default() -> Self {
        Self::new()
    }
}

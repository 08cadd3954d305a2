//! Drives an engine over a game and collects reconciled suggestions.
//!
//! [`AnalysisSession`] is the synchronous core: it builds the commands for a
//! search and folds engine events into its stores one at a time, in arrival
//! order. [`analyze_game`] runs it against any [`UciTransport`].

use std::collections::VecDeque;

use chess::{Evaluation, Game, GameError, Position, PositionKey, StartPosition};
use engine::{
    EngineCommand, EngineError, EngineEvent, GoParams, UciEvent, UciTransport, MAX_MULTIPV,
};
use serde::{Deserialize, Serialize};

use crate::reconciler::{reconcile, Reconciliation, ReconcilerConfig, TopMove};
use crate::store::{MoveAnnotation, PositionTopMoves, RankedTopMoves};
use crate::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub go: GoParams,
    pub reconciler: ReconcilerConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            go: GoParams::depth_and_movetime(15, 1000),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

/// What an engine event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Scored(Reconciliation),
    SearchFinished { best_move: Option<String> },
    Ignored,
}

/// Per-run analysis state: the active position, its ranked suggestions and
/// the suggestions gathered for every position searched so far.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    active: Option<Position>,
    /// Searches issued and not yet answered by `bestmove`, oldest first.
    /// Engine lines belong to the front one.
    pending: VecDeque<Position>,
    ranked: RankedTopMoves,
    evaluation: Option<Evaluation>,
    store: PositionTopMoves,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Start searching the position after `ply` half-moves of `game`.
    ///
    /// Clears the ranked list and the evaluation of the previous search, and
    /// returns the `position` and `go` commands to send. A search still in
    /// flight is superseded: its remaining lines only reach the store, under
    /// its own position's key.
    pub fn begin_search(&mut self, game: &Game, ply: usize) -> Result<Vec<EngineCommand>, GameError> {
        let position = game.position_at(ply)?;
        let fen = match game.start_position() {
            StartPosition::Standard => None,
            StartPosition::Fen(fen) => Some(fen.clone()),
        };
        let mut moves = game.uci_moves();
        moves.truncate(ply);

        tracing::debug!(ply, key = %position.key(), superseded = self.pending.len(), "Starting search");
        self.pending.push_back(position.clone());
        self.active = Some(position);
        self.ranked.clear();
        self.evaluation = None;

        Ok(vec![
            EngineCommand::SetPosition { fen, moves },
            EngineCommand::Go(self.config.go),
        ])
    }

    pub fn handle_event(&mut self, event: &UciEvent) -> SessionUpdate {
        match event {
            UciEvent::ScoreUpdate(update) => {
                if update.rank > MAX_MULTIPV {
                    tracing::debug!(rank = update.rank, "Ignoring out-of-range rank");
                    return SessionUpdate::Ignored;
                }
                let Some(position) = self.pending.front() else {
                    return SessionUpdate::Ignored;
                };
                let result = reconcile(update, position, &self.config.reconciler);
                if let Some(diagnostic) = &result.diagnostic {
                    tracing::debug!(rank = result.rank, %diagnostic, "Reconciled with fallback");
                }

                // Lines of a superseded search only feed the store.
                if self.pending.len() == 1 {
                    self.ranked.insert(result.rank, result.top_move.clone());
                    if result.rank <= 1 {
                        self.evaluation = Some(result.top_move.evaluation);
                    }
                }
                // Raw fallback moves are shown for the active position only.
                if result.converted {
                    self.store.merge(result.key.clone(), result.top_move.clone());
                }
                SessionUpdate::Scored(result)
            }
            UciEvent::BestMove { mv, .. } => {
                if self.pending.pop_front().is_none() {
                    return SessionUpdate::Ignored;
                }
                if !self.pending.is_empty() {
                    tracing::debug!(best = ?mv, "Superseded search finished");
                    return SessionUpdate::Ignored;
                }
                SessionUpdate::SearchFinished {
                    best_move: mv.clone(),
                }
            }
            _ => SessionUpdate::Ignored,
        }
    }

    pub fn is_searching(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn active_position(&self) -> Option<&Position> {
        self.active.as_ref()
    }

    pub fn ranked(&self) -> &RankedTopMoves {
        &self.ranked
    }

    /// Rank-1 evaluation of the current search, White's point of view.
    pub fn evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    pub fn store(&self) -> &PositionTopMoves {
        &self.store
    }

    pub fn into_store(self) -> PositionTopMoves {
        self.store
    }
}

/// Result of one search in [`analyze_game`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAnalysis {
    /// Half-moves played before this position.
    pub ply: usize,
    pub key: PositionKey,
    pub evaluation: Option<Evaluation>,
    pub best_move: Option<String>,
    pub top_moves: Vec<TopMove>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAnalysis {
    pub positions: Vec<PositionAnalysis>,
    pub annotations: Vec<MoveAnnotation>,
    pub position_top_moves: PositionTopMoves,
}

/// Search every position of `game`, from the start to the final position,
/// one search at a time.
#[tracing::instrument(level = "info", skip_all, fields(plies = game.len()))]
pub async fn analyze_game<T>(
    engine: &mut T,
    game: &Game,
    config: AnalysisConfig,
) -> Result<GameAnalysis, AnalysisError>
where
    T: UciTransport + ?Sized,
{
    let mut session = AnalysisSession::new(config);
    let mut positions = Vec::with_capacity(game.len() + 1);

    for ply in 0..=game.len() {
        for cmd in session.begin_search(game, ply)? {
            engine.send(cmd).await?;
        }

        let best_move = loop {
            match engine.recv().await {
                Some(EngineEvent::Uci(event)) => {
                    if let SessionUpdate::SearchFinished { best_move } = session.handle_event(&event) {
                        break best_move;
                    }
                }
                Some(EngineEvent::Failed(reason)) => {
                    tracing::error!(ply, %reason, "Engine failed during analysis");
                    return Err(EngineError::Failed(reason).into());
                }
                None => return Err(EngineError::ChannelClosed.into()),
            }
        };

        let key = session
            .active_position()
            .map(Position::key)
            .ok_or(AnalysisError::NoActiveSearch)?;
        tracing::debug!(ply, evaluation = ?session.evaluation(), best = ?best_move, "Position analysed");
        positions.push(PositionAnalysis {
            ply,
            key,
            evaluation: session.evaluation(),
            best_move,
            top_moves: session.ranked().to_vec(),
        });
    }

    let annotations = session.store().annotate(game);
    tracing::info!(positions = positions.len(), "Game analysis complete");
    Ok(GameAnalysis {
        positions,
        annotations,
        position_top_moves: session.into_store(),
    })
}

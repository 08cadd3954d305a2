//! Opening classification and engine-line reconciliation for chess games.
//!
//! The two halves are independent: [`OpeningClassifier`] names what was
//! played, [`reconcile`] turns engine output into SAN suggestions for a
//! tracked position. [`AnalysisSession`] and [`analyze_game`] drive the
//! latter against an engine, and [`library`] / [`archive`] work on whole
//! game collections.

pub mod archive;
pub mod classifier;
pub mod corpus;
pub mod library;
pub mod reconciler;
pub mod session;
pub mod store;

pub use archive::{
    collect_recent_games, ArchiveError, ArchiveGame, ArchiveMonth, ArchivePlayer, ArchiveWindow,
    DirectoryArchive, GameArchive, MonthlyArchive,
};
pub use classifier::{
    DefenseMatch, OpeningAnalysis, OpeningClassifier, PositionMatch, MAX_PREFIX_MOVES,
};
pub use corpus::{Corpus, CorpusError, OpeningEntry};
pub use library::{
    annotate_records, defense_stats, opening_stats, ColorFilter, GameRecord, LibraryFilter,
    OpeningStats, ResultFilter,
};
pub use reconciler::{
    find_bridging_move, reconcile, BridgingPolicy, Reconciliation, ReconcilerConfig,
    ScorePerspective, TopMove, TOP_MOVE_PV_LEN,
};
pub use session::{
    analyze_game, AnalysisConfig, AnalysisSession, GameAnalysis, PositionAnalysis, SessionUpdate,
};
pub use store::{MoveAnnotation, MoveVerdict, PositionTopMoves, RankedTopMoves};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
    #[error(transparent)]
    Game(#[from] chess::GameError),
    #[error("No search was started")]
    NoActiveSearch,
}

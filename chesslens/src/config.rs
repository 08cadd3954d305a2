//! Runtime configuration for chesslens.
//!
//! Every tunable has a compile-time default and can be overridden by an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;

/// Default `go depth`.
const DEFAULT_SEARCH_DEPTH: u32 = 15;

/// Default `go movetime`, in milliseconds.
const DEFAULT_MOVETIME_MS: u64 = 1000;

/// Default number of ranked lines per search.
const DEFAULT_MULTIPV: u32 = 3;

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Get the engine executable.
///
/// Priority:
/// 1. `CHESSLENS_STOCKFISH_PATH` env variable if set
/// 2. `None`: the engine crate searches the usual install locations
pub fn get_stockfish_path() -> Option<PathBuf> {
    env_path("CHESSLENS_STOCKFISH_PATH")
}

/// White openings corpus file, `None` for the bundled one.
pub fn get_openings_path() -> Option<PathBuf> {
    env_path("CHESSLENS_OPENINGS_PATH")
}

/// Black defenses corpus file, `None` for the bundled one.
pub fn get_defenses_path() -> Option<PathBuf> {
    env_path("CHESSLENS_DEFENSES_PATH")
}

/// Get the search depth.
///
/// Priority:
/// 1. `CHESSLENS_DEPTH` env variable if set (falls back to default if the
///    value cannot be parsed)
/// 2. `15` as fallback
pub fn get_search_depth() -> u32 {
    if let Ok(depth) = std::env::var("CHESSLENS_DEPTH") {
        return depth.parse().unwrap_or(DEFAULT_SEARCH_DEPTH);
    }

    DEFAULT_SEARCH_DEPTH
}

/// Get the per-position search time in milliseconds (`CHESSLENS_MOVETIME_MS`,
/// default 1000).
pub fn get_movetime_ms() -> u64 {
    if let Ok(movetime) = std::env::var("CHESSLENS_MOVETIME_MS") {
        return movetime.parse().unwrap_or(DEFAULT_MOVETIME_MS);
    }

    DEFAULT_MOVETIME_MS
}

pub fn get_multipv() -> u32 {
    if let Ok(multipv) = std::env::var("CHESSLENS_MULTIPV") {
        return multipv.parse().unwrap_or(DEFAULT_MULTIPV);
    }

    DEFAULT_MULTIPV
}

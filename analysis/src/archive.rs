//! Month-by-month game archives and the recent-games window built on them.

use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::library::GameRecord;

/// A calendar month, `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
}

impl ArchiveMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ArchiveError> {
        if !(1..=12).contains(&month) {
            return Err(ArchiveError::InvalidMonth(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    pub fn previous(self) -> Self {
        match self.month {
            1 => Self {
                year: self.year - 1,
                month: 12,
            },
            m => Self {
                year: self.year,
                month: m - 1,
            },
        }
    }
}

impl std::fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM` or `YYYY/MM`.
impl FromStr for ArchiveMonth {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ArchiveError::InvalidMonth(s.to_string());
        let (year, month) = s.split_once(['-', '/']).ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePlayer {
    pub username: String,
    /// `win`, `checkmated`, `resigned`, `agreed`, ...
    pub result: String,
}

/// One game as it appears in a monthly archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveGame {
    pub uuid: String,
    pub end_time: i64,
    pub white: ArchivePlayer,
    pub black: ArchivePlayer,
    #[serde(default)]
    pub pgn: String,
}

impl ArchiveGame {
    pub fn result(&self) -> &'static str {
        if self.white.result == "win" {
            "1-0"
        } else if self.black.result == "win" {
            "0-1"
        } else {
            "1/2-1/2"
        }
    }

    pub fn into_record(self) -> GameRecord {
        GameRecord {
            result: self.result().to_string(),
            id: self.uuid,
            date: self.end_time,
            white: self.white.username,
            black: self.black.username,
            pgn: self.pgn,
            opening: None,
            black_defense: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyArchive {
    #[serde(default)]
    pub games: Vec<ArchiveGame>,
}

impl MonthlyArchive {
    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A source of monthly archives. An HTTP client for a chess site plugs in
/// here; [`DirectoryArchive`] reads saved archives from disk.
#[async_trait]
pub trait GameArchive: Send + Sync {
    /// The games `username` finished in `month`. A month the source has no
    /// archive for is [`ArchiveError::NotFound`].
    async fn fetch_month(
        &self,
        username: &str,
        month: ArchiveMonth,
    ) -> Result<MonthlyArchive, ArchiveError>;
}

/// Archives saved as `<root>/<username>/<YYYY>/<MM>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn month_path(&self, username: &str, month: ArchiveMonth) -> PathBuf {
        self.root
            .join(username)
            .join(month.year.to_string())
            .join(format!("{:02}.json", month.month))
    }
}

#[async_trait]
impl GameArchive for DirectoryArchive {
    async fn fetch_month(
        &self,
        username: &str,
        month: ArchiveMonth,
    ) -> Result<MonthlyArchive, ArchiveError> {
        let path = self.month_path(username, month);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchiveError::NotFound(month));
            }
            Err(e) => return Err(e.into()),
        };
        MonthlyArchive::from_json(&json)
    }
}

/// How far back to look and how many games to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveWindow {
    pub months: usize,
    pub limit: usize,
}

impl Default for ArchiveWindow {
    fn default() -> Self {
        Self {
            months: 6,
            limit: 200,
        }
    }
}

/// Gather `username`'s most recent games, walking back month by month from
/// `newest`.
///
/// Stops once `window.limit` games are in hand or `window.months` months
/// were tried. Months that fail are skipped; only when every attempted
/// month fails is the whole collection an error. Missing months count as
/// empty, not failed. Newest games come first.
#[tracing::instrument(level = "info", skip(archive, window), fields(months = window.months, limit = window.limit))]
pub async fn collect_recent_games<A>(
    archive: &A,
    username: &str,
    newest: ArchiveMonth,
    window: ArchiveWindow,
) -> Result<Vec<GameRecord>, ArchiveError>
where
    A: GameArchive + ?Sized,
{
    if username.trim().is_empty() {
        return Err(ArchiveError::MissingUsername);
    }

    let mut games: Vec<ArchiveGame> = Vec::new();
    let mut month = newest;
    let mut attempted = 0;
    let mut failed = 0;

    while attempted < window.months && games.len() < window.limit {
        attempted += 1;
        match archive.fetch_month(username, month).await {
            Ok(monthly) => {
                tracing::debug!(%month, games = monthly.games.len(), "Fetched month");
                games.extend(monthly.games);
            }
            Err(ArchiveError::NotFound(_)) => {
                tracing::debug!(%month, "No archive for month");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(%month, "Skipping month: {}", e);
            }
        }
        month = month.previous();
    }

    if attempted > 0 && failed == attempted {
        return Err(ArchiveError::AllMonthsFailed { attempted });
    }

    games.sort_by(|a, b| b.end_time.cmp(&a.end_time));
    games.truncate(window.limit);
    tracing::info!(games = games.len(), months = attempted, "Collected recent games");
    Ok(games.into_iter().map(ArchiveGame::into_record).collect())
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("No archive for {0}")]
    NotFound(ArchiveMonth),
    #[error("Username is required")]
    MissingUsername,
    #[error("Invalid month: {0}")]
    InvalidMonth(String),
    #[error("Failed to fetch archive: {0}")]
    Fetch(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid archive JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("All {attempted} archive months failed")]
    AllMonthsFailed { attempted: usize },
}

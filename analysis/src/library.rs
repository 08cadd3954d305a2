//! A player's game list: opening annotation, filtering and per-opening
//! results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::OpeningClassifier;

/// A finished game as delivered by a game source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    /// Unix seconds.
    pub date: i64,
    pub white: String,
    pub black: String,
    /// `1-0`, `0-1` or `1/2-1/2`.
    pub result: String,
    pub pgn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black_defense: Option<String>,
}

impl GameRecord {
    pub fn is_white(&self, username: &str) -> bool {
        self.white == username
    }

    pub fn is_win_for(&self, username: &str) -> bool {
        if self.is_white(username) {
            self.result == "1-0"
        } else {
            self.result == "0-1"
        }
    }

    pub fn is_loss_for(&self, username: &str) -> bool {
        if self.is_white(username) {
            self.result == "0-1"
        } else {
            self.result == "1-0"
        }
    }
}

/// Fill in `opening` and `black_defense` for every record. Records whose
/// PGN cannot be replayed are left as they are.
pub fn annotate_records(records: &mut [GameRecord], classifier: &OpeningClassifier) {
    let mut failed = 0;
    for record in records.iter_mut() {
        match classifier.classify_pgn(&record.pgn) {
            Ok(analysis) => {
                record.opening = analysis.matched_opening;
                record.black_defense = analysis.matched_black_defense;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(game_id = %record.id, "Skipping unreadable PGN: {}", e);
            }
        }
    }
    tracing::info!(records = records.len(), failed, "Annotated game records");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFilter {
    #[default]
    All,
    White,
    Black,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFilter {
    #[default]
    All,
    Won,
    Lost,
}

/// Which records to show, from one player's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub color: ColorFilter,
    pub result: ResultFilter,
    /// Only games where the player had White and played this opening.
    pub opening: Option<String>,
    /// Only games where the player had Black and played this defense.
    pub defense: Option<String>,
}

impl LibraryFilter {
    pub fn matches(&self, record: &GameRecord, username: &str) -> bool {
        match self.color {
            ColorFilter::White if record.black == username => return false,
            ColorFilter::Black if record.white == username => return false,
            _ => {}
        }

        match self.result {
            ResultFilter::Won if !record.is_win_for(username) => return false,
            ResultFilter::Lost if !record.is_loss_for(username) => return false,
            _ => {}
        }

        if let Some(opening) = &self.opening {
            if record.white != username || record.opening.as_ref() != Some(opening) {
                return false;
            }
        }
        if let Some(defense) = &self.defense {
            if record.black != username || record.black_defense.as_ref() != Some(defense) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [GameRecord], username: &str) -> Vec<&'a GameRecord> {
        records
            .iter()
            .filter(|record| self.matches(record, username))
            .collect()
    }
}

/// Results with one opening or defense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningStats {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub total: u32,
}

/// Per-opening results over the games `username` played as White.
pub fn opening_stats(records: &[GameRecord], username: &str) -> Vec<OpeningStats> {
    collect_stats(records, username, |record| {
        record
            .is_white(username)
            .then_some(record.opening.as_deref())
            .flatten()
    })
}

/// Per-defense results over the games `username` played as Black.
pub fn defense_stats(records: &[GameRecord], username: &str) -> Vec<OpeningStats> {
    collect_stats(records, username, |record| {
        (!record.is_white(username))
            .then_some(record.black_defense.as_deref())
            .flatten()
    })
}

/// Most played first; equal totals by name.
fn collect_stats<'a>(
    records: &'a [GameRecord],
    username: &str,
    name_of: impl Fn(&'a GameRecord) -> Option<&'a str>,
) -> Vec<OpeningStats> {
    let mut by_name: HashMap<&str, OpeningStats> = HashMap::new();
    for record in records {
        let Some(name) = name_of(record) else {
            continue;
        };
        let stats = by_name.entry(name).or_insert_with(|| OpeningStats {
            name: name.to_string(),
            wins: 0,
            losses: 0,
            total: 0,
        });
        if record.is_win_for(username) {
            stats.wins += 1;
        }
        if record.is_loss_for(username) {
            stats.losses += 1;
        }
        stats.total += 1;
    }

    let mut stats: Vec<OpeningStats> = by_name.into_values().collect();
    stats.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    stats
}

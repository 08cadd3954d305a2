use std::collections::HashMap;

use analysis::{
    annotate_records, collect_recent_games, opening_stats, ArchiveError, ArchiveGame,
    ArchiveMonth, ArchivePlayer, ArchiveWindow, DirectoryArchive, GameArchive, MonthlyArchive,
    OpeningClassifier,
};
use async_trait::async_trait;

/// In-memory archive; months not listed are missing.
struct MemoryArchive {
    months: HashMap<ArchiveMonth, Result<Vec<ArchiveGame>, String>>,
}

#[async_trait]
impl GameArchive for MemoryArchive {
    async fn fetch_month(
        &self,
        _username: &str,
        month: ArchiveMonth,
    ) -> Result<MonthlyArchive, ArchiveError> {
        match self.months.get(&month) {
            Some(Ok(games)) => Ok(MonthlyArchive {
                games: games.clone(),
            }),
            Some(Err(e)) => Err(ArchiveError::Fetch(e.clone())),
            None => Err(ArchiveError::NotFound(month)),
        }
    }
}

fn month(year: i32, month: u32) -> ArchiveMonth {
    ArchiveMonth::new(year, month).unwrap()
}

fn game(uuid: &str, end_time: i64, white_result: &str, black_result: &str) -> ArchiveGame {
    ArchiveGame {
        uuid: uuid.to_string(),
        end_time,
        white: ArchivePlayer {
            username: "alice".to_string(),
            result: white_result.to_string(),
        },
        black: ArchivePlayer {
            username: "bob".to_string(),
            result: black_result.to_string(),
        },
        pgn: "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 *".to_string(),
    }
}

#[tokio::test]
async fn newest_games_first_across_months() {
    let archive = MemoryArchive {
        months: HashMap::from([
            (month(2024, 3), Ok(vec![game("a", 300, "win", "checkmated")])),
            (month(2024, 2), Err("HTTP 500".to_string())),
            (
                month(2024, 1),
                Ok(vec![
                    game("b", 100, "resigned", "win"),
                    game("c", 150, "agreed", "agreed"),
                ]),
            ),
            (month(2023, 12), Ok(vec![game("old", 50, "win", "lost")])),
        ]),
    };

    let window = ArchiveWindow {
        months: 3,
        limit: 200,
    };
    let records = collect_recent_games(&archive, "alice", month(2024, 3), window)
        .await
        .unwrap();

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "b"]);
    let results: Vec<&str> = records.iter().map(|r| r.result.as_str()).collect();
    assert_eq!(results, vec!["1-0", "1/2-1/2", "0-1"]);
}

#[tokio::test]
async fn stops_once_the_limit_is_reached() {
    let archive = MemoryArchive {
        months: HashMap::from([
            (
                month(2024, 12),
                Ok(vec![game("x", 10, "win", "lost"), game("y", 30, "win", "lost")]),
            ),
            (month(2024, 11), Ok(vec![game("z", 20, "win", "lost")])),
        ]),
    };
    let window = ArchiveWindow {
        months: 6,
        limit: 1,
    };
    let records = collect_recent_games(&archive, "alice", month(2024, 12), window)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "y");
}

#[tokio::test]
async fn missing_months_are_empty_not_failed() {
    let archive = MemoryArchive {
        months: HashMap::new(),
    };
    let records = collect_recent_games(&archive, "alice", month(2024, 5), ArchiveWindow::default())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn all_failed_months_is_an_error() {
    let archive = MemoryArchive {
        months: (1..=6)
            .map(|m| (month(2024, m), Err("timeout".to_string())))
            .collect(),
    };
    let err = collect_recent_games(&archive, "alice", month(2024, 6), ArchiveWindow::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::AllMonthsFailed { attempted: 6 }));

    let err = collect_recent_games(&archive, " ", month(2024, 6), ArchiveWindow::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::MissingUsername));
}

#[tokio::test]
async fn directory_archive_feeds_the_library() {
    let dir = tempfile::tempdir().unwrap();
    let archive = DirectoryArchive::new(dir.path());
    let path = archive.month_path("alice", month(2024, 4));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let monthly = MonthlyArchive {
        games: vec![game("g1", 500, "win", "resigned"), game("g2", 400, "timeout", "win")],
    };
    std::fs::write(&path, serde_json::to_string(&monthly).unwrap()).unwrap();

    let mut records =
        collect_recent_games(&archive, "alice", month(2024, 5), ArchiveWindow::default())
            .await
            .unwrap();
    assert_eq!(records.len(), 2);

    annotate_records(&mut records, &OpeningClassifier::builtin().unwrap());
    assert_eq!(records[0].opening.as_deref(), Some("Italian Game"));

    let stats = opening_stats(&records, "alice");
    assert_eq!(stats.len(), 1);
    assert_eq!((stats[0].wins, stats[0].losses, stats[0].total), (1, 1, 2));
}

#[tokio::test]
async fn unreadable_month_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let archive = DirectoryArchive::new(dir.path());
    let bad = archive.month_path("alice", month(2024, 5));
    std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
    std::fs::write(&bad, "not json").unwrap();

    let window = ArchiveWindow {
        months: 1,
        limit: 200,
    };
    let err = collect_recent_games(&archive, "alice", month(2024, 5), window)
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::AllMonthsFailed { attempted: 1 }));
}

//! chesslens: opening classification and engine review for chess games.
//!
//! Three subcommands:
//!
//! - `classify` names the opening and defense of a PGN game.
//! - `analyze` runs Stockfish over every position of a PGN game and marks
//!   each played move against the engine's ranked suggestions.
//! - `library` gathers a player's recent games from saved monthly archives,
//!   classifies them, filters them and reports per-opening results.
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use analysis::{
    analyze_game, annotate_records, collect_recent_games, defense_stats, opening_stats,
    AnalysisConfig, ArchiveMonth, ArchiveWindow, BridgingPolicy, ColorFilter, Corpus,
    DirectoryArchive, GameAnalysis, LibraryFilter, MoveVerdict, OpeningAnalysis,
    OpeningClassifier, OpeningStats, ReconcilerConfig, ResultFilter, ScorePerspective,
};
use anyhow::Context;
use chess::{parse_pgn, PgnGame};
use clap::{Parser, Subcommand, ValueEnum};
use engine::{EngineOptions, GoParams, StockfishConfig, StockfishEngine};

mod config;

#[derive(Parser)]
#[command(name = "chesslens", about = "Opening classification and engine review for chess games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Name the opening and defense of a game.
    Classify {
        /// PGN file; reads stdin when omitted.
        pgn: Option<PathBuf>,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Search every position of a game with the engine.
    Analyze {
        /// PGN file; reads stdin when omitted.
        pgn: Option<PathBuf>,
        /// Engine executable (overrides CHESSLENS_STOCKFISH_PATH).
        #[arg(long)]
        engine: Option<PathBuf>,
        #[arg(long)]
        depth: Option<u32>,
        /// Search time per position in milliseconds.
        #[arg(long)]
        movetime: Option<u64>,
        #[arg(long)]
        multipv: Option<u32>,
        /// Treat engine scores as relative to the side to move.
        #[arg(long)]
        side_to_move_scores: bool,
        /// Never play a bridging move before a reported move.
        #[arg(long)]
        no_bridging: bool,
        #[arg(long)]
        json: bool,
    },
    /// Classify and filter a player's recent games.
    Library {
        /// Directory of saved archives, laid out as <user>/<YYYY>/<MM>.json.
        #[arg(long)]
        archive_dir: PathBuf,
        #[arg(long)]
        username: String,
        /// Newest month to read, as YYYY-MM.
        #[arg(long)]
        month: ArchiveMonth,
        /// How many months to walk back.
        #[arg(long, default_value_t = 6)]
        months: usize,
        /// Maximum number of games kept.
        #[arg(long, default_value_t = 200)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = ColorArg::All)]
        color: ColorArg,
        #[arg(long, value_enum, default_value_t = ResultArg::All)]
        result: ResultArg,
        /// Only games with this opening, played as White.
        #[arg(long)]
        opening: Option<String>,
        /// Only games with this defense, played as Black.
        #[arg(long)]
        defense: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorArg {
    All,
    White,
    Black,
}

impl From<ColorArg> for ColorFilter {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::All => Self::All,
            ColorArg::White => Self::White,
            ColorArg::Black => Self::Black,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ResultArg {
    All,
    Won,
    Lost,
}

impl From<ResultArg> for ResultFilter {
    fn from(arg: ResultArg) -> Self {
        match arg {
            ResultArg::All => Self::All,
            ResultArg::Won => Self::Won,
            ResultArg::Lost => Self::Lost,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with span durations
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { pgn, json } => {
            let game = read_pgn(pgn.as_deref())?;
            let classifier = load_classifier()?;
            let analysis = classifier.classify(&game.game);
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                print_classification(&analysis);
            }
        }
        Commands::Analyze {
            pgn,
            engine,
            depth,
            movetime,
            multipv,
            side_to_move_scores,
            no_bridging,
            json,
        } => {
            let game = read_pgn(pgn.as_deref())?;
            let engine_config = StockfishConfig {
                path: engine.or_else(config::get_stockfish_path),
                options: EngineOptions {
                    multipv: multipv.unwrap_or_else(config::get_multipv),
                    ..EngineOptions::default()
                },
                label: Some("analyze".to_string()),
                ..StockfishConfig::default()
            };
            let analysis_config = AnalysisConfig {
                go: GoParams::depth_and_movetime(
                    depth.unwrap_or_else(config::get_search_depth),
                    movetime.unwrap_or_else(config::get_movetime_ms),
                ),
                reconciler: ReconcilerConfig {
                    perspective: if side_to_move_scores {
                        ScorePerspective::SideToMove
                    } else {
                        ScorePerspective::WhiteRelative
                    },
                    bridging: if no_bridging {
                        BridgingPolicy::Disabled
                    } else {
                        BridgingPolicy::FirstSecondRankOrigin
                    },
                },
            };

            let mut engine = StockfishEngine::spawn_with_config(engine_config)
                .await
                .context("failed to start the engine")?;
            let result = analyze_game(&mut engine, &game.game, analysis_config).await;
            engine.shutdown().await;
            let result = result.context("analysis failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                if let (Some(white), Some(black)) = (game.tag("White"), game.tag("Black")) {
                    println!("{} vs {}", white, black);
                }
                print_game_analysis(&result);
            }
        }
        Commands::Library {
            archive_dir,
            username,
            month,
            months,
            limit,
            color,
            result,
            opening,
            defense,
            json,
        } => {
            let archive = DirectoryArchive::new(archive_dir);
            let window = ArchiveWindow { months, limit };
            let mut records = collect_recent_games(&archive, &username, month, window)
                .await
                .context("failed to collect games")?;

            let classifier = load_classifier()?;
            annotate_records(&mut records, &classifier);

            let filter = LibraryFilter {
                color: color.into(),
                result: result.into(),
                opening,
                defense,
            };
            let shown = filter.apply(&records, &username);
            let openings = opening_stats(&records, &username);
            let defenses = defense_stats(&records, &username);

            if json {
                let output = serde_json::json!({
                    "games": shown,
                    "openingStats": openings,
                    "defenseStats": defenses,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for record in &shown {
                    println!(
                        "{}  {} vs {}  {}  {}",
                        record.id,
                        record.white,
                        record.black,
                        record.result,
                        record
                            .opening
                            .as_deref()
                            .or(record.black_defense.as_deref())
                            .unwrap_or("-"),
                    );
                }
                println!();
                print_stats("Openings (as White)", &openings);
                print_stats("Defenses (as Black)", &defenses);
            }
        }
    }

    Ok(())
}

fn read_pgn(path: Option<&Path>) -> anyhow::Result<PgnGame> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };
    let game = parse_pgn(&text).context("invalid PGN")?;
    tracing::info!(plies = game.game.len(), "Loaded game");
    Ok(game)
}

fn load_classifier() -> anyhow::Result<OpeningClassifier> {
    let openings = match config::get_openings_path() {
        Some(path) => Arc::new(Corpus::load(&path)?),
        None => Corpus::builtin_openings()?,
    };
    let defenses = match config::get_defenses_path() {
        Some(path) => Arc::new(Corpus::load(&path)?),
        None => Corpus::builtin_defenses()?,
    };
    Ok(OpeningClassifier::new(openings, defenses))
}

fn print_classification(analysis: &OpeningAnalysis) {
    println!(
        "Opening: {}",
        analysis.matched_opening.as_deref().unwrap_or("no identified opening")
    );
    println!(
        "Defense: {}",
        analysis
            .matched_black_defense
            .as_deref()
            .unwrap_or("no identified defense")
    );
    for entry in &analysis.position_matches {
        println!(
            "  White move {}: {} match(es) {}",
            entry.move_number,
            entry.total_matching_openings,
            entry.matched_openings.join(", ")
        );
    }
    for entry in &analysis.black_defense_matches {
        println!(
            "  Move {}: {} defense(s) {}",
            entry.move_number,
            entry.total_matching_defenses,
            entry.matched_defenses.join(", ")
        );
    }
}

fn print_game_analysis(result: &GameAnalysis) {
    for (position, annotation) in result.positions.iter().zip(&result.annotations) {
        let marker = match annotation.verdict {
            MoveVerdict::TopMove => "top",
            MoveVerdict::NotTopMove => "   ",
            MoveVerdict::Unanalysed => " ? ",
        };
        let eval = position
            .evaluation
            .map(|e| e.display())
            .unwrap_or_else(|| "-".to_string());
        let suggestions: Vec<&str> = position
            .top_moves
            .iter()
            .map(|m| m.notation.as_str())
            .collect();
        println!(
            "{:>3}. {:<8} [{}] eval {:>6}  engine: {}",
            annotation.ply,
            annotation.san,
            marker,
            eval,
            suggestions.join(", ")
        );
    }
    if let Some(last) = result.positions.last() {
        if let Some(eval) = last.evaluation {
            println!("Final evaluation: {}", eval);
        }
    }
}

fn print_stats(title: &str, stats: &[OpeningStats]) {
    println!("{}:", title);
    for entry in stats {
        println!(
            "  {:<40} {:>3} games  {:>3} won  {:>3} lost",
            entry.name, entry.total, entry.wins, entry.losses
        );
    }
}

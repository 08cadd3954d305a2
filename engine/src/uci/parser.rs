//! Total, side-effect-free parser for engine output lines.
//!
//! Every line maps to exactly one [`UciEvent`]; lines that are not part of
//! the recognised subset come back as [`UciEvent::Unrecognized`] instead of
//! an error.

/// Highest MultiPV rank an engine may report (Stockfish's option maximum).
/// Lines outside `1..=MAX_MULTIPV` are not score updates.
pub const MAX_MULTIPV: u32 = 500;

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciEvent {
    Id { key: String, value: String },
    UciOk,
    ReadyOk,
    ScoreUpdate(ScoreUpdate),
    /// `mv` is `None` for `bestmove (none)` (no legal move in the position).
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Centipawns,
    Mate,
}

/// One ranked line of a MultiPV search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub depth: u32,
    /// MultiPV rank, 1 = best.
    pub rank: u32,
    pub kind: ScoreKind,
    /// Raw engine score: centipawns or moves-to-mate, in the engine's own
    /// sign convention.
    pub value: i32,
    /// First move of the principal variation, in coordinate form.
    pub mv: String,
    /// The full principal variation, `mv` included.
    pub pv: Vec<String>,
}

/// Parse a UCI message line
pub fn parse_uci_line(line: &str) -> UciEvent {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => UciEvent::UciOk,
        Some(&"readyok") => UciEvent::ReadyOk,

        Some(&"id") if tokens.len() >= 3 => UciEvent::Id {
            key: tokens[1].to_string(),
            value: tokens[2..].join(" "),
        },

        Some(&"bestmove") if tokens.len() >= 2 => {
            let mv = Some(tokens[1])
                .filter(|m| *m != "(none)")
                .map(str::to_string);
            let ponder = match tokens.get(2..4) {
                Some(["ponder", p]) => Some(p.to_string()),
                _ => None,
            };
            UciEvent::BestMove { mv, ponder }
        }

        Some(&"info") => parse_info_line(&tokens[1..])
            .map(UciEvent::ScoreUpdate)
            .unwrap_or_else(|| UciEvent::Unrecognized(line.to_string())),

        _ => UciEvent::Unrecognized(line.to_string()),
    }
}

/// Parse an "info" line from the engine. Only lines carrying a depth, a
/// score and a principal variation are score updates.
fn parse_info_line(tokens: &[&str]) -> Option<ScoreUpdate> {
    let mut depth = None;
    let mut rank = None;
    let mut score = None;
    let mut pv: Vec<String> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "multipv" => {
                i += 1;
                // A malformed rank is out of range, not a missing one.
                rank = Some(tokens.get(i).and_then(|s| s.parse().ok()).unwrap_or(0));
            }
            "score" => {
                i += 1;
                let kind = match tokens.get(i) {
                    Some(&"cp") => Some(ScoreKind::Centipawns),
                    Some(&"mate") => Some(ScoreKind::Mate),
                    _ => None,
                };
                i += 1;
                let value = tokens.get(i).and_then(|s| s.parse::<i32>().ok());
                score = kind.zip(value);
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    pv.push(tokens[i].to_string());
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "string" => {
                // Free text runs to end of line.
                break;
            }
            _ => {
                // Unknown keyword or an argument we don't track, skip
            }
        }
        i += 1;
    }

    let (kind, value) = score?;
    let mv = pv.first()?.clone();
    let rank = rank.unwrap_or(1);
    if !(1..=MAX_MULTIPV).contains(&rank) {
        return None;
    }

    Some(ScoreUpdate {
        depth: depth?,
        rank,
        kind,
        value,
        mv,
        pv,
    })
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "string"
            | "refutation"
            | "currline"
            | "wdl"
    )
}

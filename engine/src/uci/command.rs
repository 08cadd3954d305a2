/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    SetOption { name: String, value: Option<String> },
    IsReady,
    /// `fen: None` means the standard starting position.
    SetPosition {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Go(GoParams),
    Stop,
    Quit,
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime: Option<u64>, // Move time in milliseconds
    pub infinite: bool,        // Search until "stop"
}

impl GoParams {
    pub fn depth_and_movetime(depth: u32, movetime_ms: u64) -> Self {
        Self {
            depth: Some(depth),
            movetime: Some(movetime_ms),
            infinite: false,
        }
    }
}

impl EngineCommand {
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        Self::SetOption {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    /// The protocol line for this command, without the trailing newline.
    pub fn to_uci_line(&self) -> String {
        match self {
            Self::Uci => "uci".to_string(),
            Self::IsReady => "isready".to_string(),
            Self::SetOption { name, value } => match value {
                Some(val) => format!("setoption name {} value {}", name, val),
                None => format!("setoption name {}", name),
            },
            Self::SetPosition { fen, moves } => {
                let mut cmd = match fen {
                    Some(fen) => format!("position fen {}", fen),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    cmd.push_str(" moves ");
                    cmd.push_str(&moves.join(" "));
                }
                cmd
            }
            Self::Go(params) => {
                let mut cmd = "go".to_string();
                if let Some(depth) = params.depth {
                    cmd.push_str(&format!(" depth {}", depth));
                }
                if let Some(movetime) = params.movetime {
                    cmd.push_str(&format!(" movetime {}", movetime));
                }
                if params.infinite {
                    cmd.push_str(" infinite");
                }
                cmd
            }
            Self::Stop => "stop".to_string(),
            Self::Quit => "quit".to_string(),
        }
    }
}

/// Engine options sent between `uciok` and `isready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub multipv: u32,
    pub threads: u32,
    pub hash_mb: u32,
    pub minimum_thinking_time_ms: u32,
    pub slow_mover: u32,
    pub limit_strength: bool,
    pub elo: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            multipv: 3,
            threads: 4,
            hash_mb: 16,
            minimum_thinking_time_ms: 20,
            slow_mover: 100,
            limit_strength: false,
            elo: 1500,
        }
    }
}

impl EngineOptions {
    pub fn to_commands(&self) -> Vec<EngineCommand> {
        vec![
            EngineCommand::set_option("MultiPV", self.multipv.max(1)),
            EngineCommand::set_option("Threads", self.threads.clamp(1, 512)),
            EngineCommand::set_option("Hash", self.hash_mb.max(1)),
            EngineCommand::set_option("Minimum Thinking Time", self.minimum_thinking_time_ms),
            EngineCommand::set_option("Slow Mover", self.slow_mover),
            EngineCommand::set_option("UCI_LimitStrength", self.limit_strength),
            EngineCommand::set_option("UCI_Elo", self.elo),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_lines() {
        let start = EngineCommand::SetPosition {
            fen: None,
            moves: vec![],
        };
        assert_eq!(start.to_uci_line(), "position startpos");

        let moved = EngineCommand::SetPosition {
            fen: None,
            moves: vec!["e2e4".to_string(), "e7e5".to_string()],
        };
        assert_eq!(moved.to_uci_line(), "position startpos moves e2e4 e7e5");

        let fen = EngineCommand::SetPosition {
            fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string()),
            moves: vec![],
        };
        assert_eq!(fen.to_uci_line(), "position fen 8/8/8/8/8/8/8/K6k w - - 0 1");
    }

    #[test]
    fn test_go_line() {
        let go = EngineCommand::Go(GoParams::depth_and_movetime(15, 1000));
        assert_eq!(go.to_uci_line(), "go depth 15 movetime 1000");
        assert_eq!(EngineCommand::Go(GoParams::default()).to_uci_line(), "go");
    }

    #[test]
    fn test_default_options() {
        let lines: Vec<String> = EngineOptions::default()
            .to_commands()
            .iter()
            .map(EngineCommand::to_uci_line)
            .collect();
        assert_eq!(
            lines,
            vec![
                "setoption name MultiPV value 3",
                "setoption name Threads value 4",
                "setoption name Hash value 16",
                "setoption name Minimum Thinking Time value 20",
                "setoption name Slow Mover value 100",
                "setoption name UCI_LimitStrength value false",
                "setoption name UCI_Elo value 1500",
            ]
        );
    }
}

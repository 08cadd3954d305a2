use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::game::{Game, GameError};

/// A parsed PGN game: its tag pairs and the replayed main line.
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub tags: HashMap<String, String>,
    pub game: Game,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}

/// Parse a PGN string and replay its main line from the start position (or
/// from the `FEN` tag when one is present).
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let without_comments = comment_re().replace_all(input, " ");
    let without_comments = line_comment_re().replace_all(&without_comments, " ");

    let tags: HashMap<String, String> = tag_re()
        .captures_iter(&without_comments)
        .map(|cap| (cap[1].to_string(), cap[2].to_string()))
        .collect();

    let mut movetext = tag_line_re().replace_all(&without_comments, " ").into_owned();

    // Variations can nest; peel them from the inside out.
    loop {
        let stripped = variation_re().replace_all(&movetext, " ").into_owned();
        if stripped == movetext {
            break;
        }
        movetext = stripped;
    }
    if movetext.contains(['(', ')']) {
        return Err(PgnError::InvalidFormat(
            "unbalanced variation parentheses".to_string(),
        ));
    }

    let movetext = nag_re().replace_all(&movetext, " ");

    let mut game = match tags.get("FEN") {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };

    let tokens = movetext
        .split_whitespace()
        .map(|token| move_number_re().replace(token, ""))
        .filter(|token| !token.is_empty() && !is_result_token(token));

    for (index, token) in tokens.enumerate() {
        game.play_san(&token).map_err(|source| PgnError::IllegalMove {
            ply: index as u32 + 1,
            san: token.to_string(),
            source: Box::new(source),
        })?;
    }

    Ok(PgnGame { tags, game })
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("PGN patterns are valid regexes"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r#"\[(\w+)\s+"([^"]*)"\]"#)
}

fn tag_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\[[^\]]*\]")
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\{[^}]*\}")
}

fn line_comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r";[^\n]*")
}

fn variation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\([^()]*\)")
}

fn nag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\$\d+")
}

fn move_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^\d+\.+")
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("Invalid PGN format: {0}")]
    InvalidFormat(String),
    #[error("Illegal move {san} at ply {ply}: {source}")]
    IllegalMove {
        ply: u32,
        san: String,
        source: Box<GameError>,
    },
    #[error("Invalid start position: {0}")]
    StartPosition(#[from] GameError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHESS_COM_PGN: &str = r#"[Event "Live Chess"]
[Site "Chess.com"]
[White "alice"]
[Black "bob"]
[Result "1-0"]

1. e4 {[%clk 0:02:59.9]} 1... e5 {[%clk 0:02:58.1]} 2. Nf3 Nc6 3. Bb5 a6
4. Ba4 Nf6 5. O-O 1-0"#;

    #[test]
    fn test_parse_tags_and_moves() {
        let pgn = parse_pgn(CHESS_COM_PGN).unwrap();
        assert_eq!(pgn.tag("White"), Some("alice"));
        assert_eq!(pgn.tag("Result"), Some("1-0"));
        assert_eq!(
            pgn.game.sans(),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O"]
        );
    }

    #[test]
    fn test_variations_nags_and_line_comments_are_skipped() {
        let text = "1. d4 $1 d5 (1... Nf6 2. c4 (2. Nf3 g6)) 2. c4 ; queen's gambit\n2... e6 *";
        assert_eq!(parse_pgn(text).unwrap().game.sans(), vec!["d4", "d5", "c4", "e6"]);
    }

    #[test]
    fn test_moves_glued_to_numbers() {
        assert_eq!(
            parse_pgn("1.e4 e5 2.Nf3").unwrap().game.sans(),
            vec!["e4", "e5", "Nf3"]
        );
    }

    #[test]
    fn test_empty_movetext() {
        let pgn = parse_pgn("[Event \"?\"]\n\n*").unwrap();
        assert!(pgn.game.sans().is_empty());
    }

    #[test]
    fn test_illegal_move_reports_ply() {
        let err = parse_pgn("1. e4 e5 2. Ke3").unwrap_err();
        match err {
            PgnError::IllegalMove { ply, san, .. } => {
                assert_eq!(ply, 3);
                assert_eq!(san, "Ke3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fen_tag_sets_start() {
        let text = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 *";
        let pgn = parse_pgn(text).unwrap();
        assert_eq!(pgn.game.sans(), vec!["e4"]);
    }

    #[test]
    fn test_unbalanced_variation() {
        assert!(matches!(
            parse_pgn("1. e4 (1. d4 e5"),
            Err(PgnError::InvalidFormat(_))
        ));
    }
}

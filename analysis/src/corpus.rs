//! Named opening reference data.
//!
//! Two corpora ship with the crate: White openings and Black defenses. Both
//! are JSON arrays of `{ "opening": name, "moves": "e4 e5 Nf3 ..." }`.
//! Either can be replaced by a file at runtime.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;

const BUILTIN_OPENINGS: &str = include_str!("../data/openings.json");
const BUILTIN_DEFENSES: &str = include_str!("../data/black_openings.json");

static OPENINGS: OnceLock<Arc<Corpus>> = OnceLock::new();
static DEFENSES: OnceLock<Arc<Corpus>> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct RawEntry {
    opening: String,
    moves: String,
}

/// One named line: its name and the half-moves that define it, in SAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningEntry {
    name: String,
    moves: Vec<String>,
    white_moves: Vec<String>,
}

impl OpeningEntry {
    pub fn new(name: impl Into<String>, moves: &str) -> Self {
        let moves: Vec<String> = moves
            .split_whitespace()
            .filter(|token| !is_move_number(token))
            .map(str::to_string)
            .collect();
        let white_moves = moves.iter().step_by(2).cloned().collect();
        Self {
            name: name.into(),
            moves,
            white_moves,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every half-move, both colours alternating.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// White's half-moves only.
    pub fn white_moves(&self) -> &[String] {
        &self.white_moves
    }
}

/// `"1."`, `"12..."` and similar.
fn is_move_number(token: &str) -> bool {
    let digits = token.trim_end_matches('.');
    digits.len() < token.len() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// An ordered, immutable collection of entries. Order matters: the
/// classifier reports the first entry that matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<OpeningEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<OpeningEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let raw: Vec<RawEntry> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|entry| OpeningEntry::new(entry.opening, &entry.moves))
            .collect();
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let json = std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let corpus = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), entries = corpus.len(), "Loaded corpus");
        Ok(corpus)
    }

    /// The bundled White openings, parsed once per process.
    pub fn builtin_openings() -> Result<Arc<Self>, CorpusError> {
        builtin(&OPENINGS, BUILTIN_OPENINGS)
    }

    /// The bundled Black defenses, parsed once per process.
    pub fn builtin_defenses() -> Result<Arc<Self>, CorpusError> {
        builtin(&DEFENSES, BUILTIN_DEFENSES)
    }

    pub fn entries(&self) -> &[OpeningEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn builtin(cell: &OnceLock<Arc<Corpus>>, json: &str) -> Result<Arc<Corpus>, CorpusError> {
    if let Some(corpus) = cell.get() {
        return Ok(Arc::clone(corpus));
    }
    let parsed = Arc::new(Corpus::from_json(json)?);
    Ok(Arc::clone(cell.get_or_init(|| parsed)))
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Failed to read corpus {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid corpus JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

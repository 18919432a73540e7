//! Puzzles, levels and the level repository.
//!
//! A level file is a JSON array of levels:
//!
//! ```json
//! [{"id": "basic", "puzzles": [{"board": {"compact": "0110"}, "types": [{"index": 0}, {"index": 1}]}]}]
//! ```
//!
//! A puzzle without `rules` (or with `null` rules) is played with classic
//! rules.

use std::path::Path;

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{Board, CoreError, CoreResult, Game, GameRules, PieceType};

fn nullable_rules<'de, D: Deserializer<'de>>(deserializer: D) -> Result<GameRules, D::Error> {
    Ok(Option::<GameRules>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelId {
    Text(String),
    Number(i64),
}

fn level_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match LevelId::deserialize(deserializer)? {
        LevelId::Text(text) => text,
        LevelId::Number(number) => number.to_string(),
    })
}

/// A starting board with the rules and palette to play it with.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
pub struct Puzzle {
    /// Starting board.
    board: Board,
    /// Rules to play with.
    #[serde(default, deserialize_with = "nullable_rules")]
    rules: GameRules,
    /// Palette of the incoming queue.
    types: Vec<PieceType>,
}

impl Puzzle {
    /// Creates a puzzle.
    pub fn new(board: Board, rules: GameRules, types: Vec<PieceType>) -> Self {
        Self {
            board,
            rules,
            types,
        }
    }

    /// A new game on a copy of the starting board.
    ///
    /// # Errors
    ///
    /// Fails when the palette is empty.
    pub fn new_game(&self) -> CoreResult<Game> {
        Game::new(self.board.clone(), self.rules, self.types.clone())
    }
}

/// An ordered collection of puzzles.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
pub struct Level {
    /// Level identifier.
    #[serde(deserialize_with = "level_id")]
    id: String,
    /// Puzzles in play order.
    puzzles: Vec<Puzzle>,
}

impl Level {
    /// Creates a level.
    pub fn new(id: impl Into<String>, puzzles: Vec<Puzzle>) -> Self {
        Self {
            id: id.into(),
            puzzles,
        }
    }

    /// The puzzle at `index`.
    pub fn get(&self, index: usize) -> Option<&Puzzle> {
        self.puzzles.get(index)
    }

    /// Number of puzzles.
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    /// Whether the level has no puzzles.
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

/// Address of a puzzle inside a [`LevelRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct PuzzleRef {
    /// Index of the level.
    pub level_index: usize,
    /// Index of the puzzle within the level.
    pub puzzle_index: usize,
}

/// A collection of levels.
///
/// Use [`LevelRepository::load`] for in-memory JSON, [`LevelRepository::from_file`]
/// for a single file, or [`LevelRepository::scan`] for a directory.
#[derive(Debug, Clone, Default)]
pub struct LevelRepository {
    levels: Vec<Level>,
}

impl LevelRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with the levels in `json`.
    ///
    /// # Errors
    ///
    /// Fails when `json` is not an array of levels.
    #[instrument(skip(self, json), fields(bytes = json.len()))]
    pub fn load(&mut self, json: &str) -> CoreResult<()> {
        self.levels = serde_json::from_str(json)?;
        info!(count = self.levels.len(), "Levels loaded");
        Ok(())
    }

    /// Repository holding the levels of one file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::level_file(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut repository = Self::new();
        repository.load(&contents)?;
        Ok(repository)
    }

    /// Loads every `*.json` level file in `dir_path`, sorted by level id.
    ///
    /// Invalid files are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Fails when the path does not exist, is not a directory, cannot be read,
    /// or yields no levels.
    #[instrument(skip(dir_path), fields(path = %dir_path.as_ref().display()))]
    pub fn scan(dir_path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = dir_path.as_ref();
        info!(path = %path.display(), "Scanning directory for level files");

        if !path.exists() {
            return Err(CoreError::level_file(format!(
                "Level directory not found: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(CoreError::level_file(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        let entries = std::fs::read_dir(path).map_err(|e| {
            CoreError::level_file(format!("Failed to read directory {}: {}", path.display(), e))
        })?;

        let mut levels = Vec::new();

        for entry_result in entries {
            let entry = entry_result.map_err(|e| {
                CoreError::level_file(format!("Failed to read directory entry: {}", e))
            })?;

            let entry_path = entry.path();

            if !entry_path.is_file() {
                debug!(path = %entry_path.display(), "Skipping non-file entry");
                continue;
            }

            if entry_path.extension().and_then(|s| s.to_str()) != Some("json") {
                debug!(path = %entry_path.display(), "Skipping non-JSON file");
                continue;
            }

            match Self::from_file(&entry_path) {
                Ok(repository) => {
                    info!(
                        count = repository.len(),
                        path = %entry_path.display(),
                        "Loaded level file"
                    );
                    levels.extend(repository.levels);
                }
                Err(e) => {
                    warn!(
                        path = %entry_path.display(),
                        error = %e,
                        "Skipping invalid level file"
                    );
                }
            }
        }

        if levels.is_empty() {
            return Err(CoreError::level_file(format!(
                "No valid levels found in: {}",
                path.display()
            )));
        }

        levels.sort_by(|a: &Level, b: &Level| a.id.cmp(&b.id));

        info!(count = levels.len(), "Level repository loaded");
        Ok(Self { levels })
    }

    /// All levels.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// The level at `index`.
    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// The puzzle `puzzle_ref` points at.
    pub fn puzzle(&self, puzzle_ref: PuzzleRef) -> Option<&Puzzle> {
        self.get(puzzle_ref.level_index)?
            .get(puzzle_ref.puzzle_index)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether no levels are loaded.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drops every level.
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

//! Solver configuration loaded from TOML.

use std::path::{Path, PathBuf};

use demondrian_core::{GameRules, PieceType, RulesPreset, SolveLimits};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// File name looked up in the default config directory.
pub const CONFIG_FILE_NAME: &str = "solver.toml";

/// Rules given either as a preset name or as an inline table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RulesSpec {
    /// A named preset such as `"classic"`.
    Preset(RulesPreset),
    /// Every rule spelled out.
    Custom(GameRules),
}

impl RulesSpec {
    /// The rules this spec resolves to.
    pub fn rules(&self) -> GameRules {
        match self {
            RulesSpec::Preset(preset) => preset.rules(),
            RulesSpec::Custom(rules) => *rules,
        }
    }
}

impl Default for RulesSpec {
    fn default() -> Self {
        RulesSpec::Preset(RulesPreset::Classic)
    }
}

/// Configuration for solving and generating boards.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct SolverConfig {
    /// Node budget of a search.
    #[serde(default = "default_max_iterations")]
    max_iterations: u64,

    /// Longest move sequence the solver explores.
    #[serde(default = "default_max_moves")]
    max_moves: usize,

    /// Palette size; the palette is types `0..types`.
    #[serde(default = "default_types")]
    types: u32,

    /// Rules of solved games.
    #[serde(default)]
    rules: RulesSpec,

    /// Seed for generated boards.
    #[serde(default)]
    seed: Option<u64>,
}

#[instrument]
fn default_max_iterations() -> u64 {
    SolveLimits::default().max_iterations
}

#[instrument]
fn default_max_moves() -> usize {
    SolveLimits::default().max_moves
}

#[instrument]
fn default_types() -> u32 {
    3
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_moves: default_max_moves(),
            types: default_types(),
            rules: RulesSpec::default(),
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        if config.types == 0 {
            return Err(ConfigError::new("Palette needs at least one type".to_string()));
        }

        info!(
            max_iterations = config.max_iterations,
            max_moves = config.max_moves,
            types = config.types,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `solver.toml` from the default config directory, or the defaults
    /// when there is no such file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument]
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_config_dir().join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Returns the default config directory.
    ///
    /// Resolution order:
    /// 1. `$DEMONDRIAN_CONFIG` environment variable
    /// 2. `$XDG_CONFIG_HOME/demondrian`
    /// 3. the current directory
    #[instrument]
    pub fn default_config_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("DEMONDRIAN_CONFIG") {
            debug!(path = %dir, "Using DEMONDRIAN_CONFIG env var");
            return PathBuf::from(dir);
        }

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            let dir = PathBuf::from(xdg).join("demondrian");
            debug!(path = %dir.display(), "Using XDG_CONFIG_HOME path");
            return dir;
        }

        debug!("Falling back to current directory");
        PathBuf::from(".")
    }

    /// Search budget.
    pub fn limits(&self) -> SolveLimits {
        SolveLimits::new(self.max_iterations, self.max_moves)
    }

    /// The palette `0..types`.
    pub fn palette(&self) -> Vec<PieceType> {
        PieceType::range(0, self.types)
    }

    /// Resolved game rules.
    pub fn game_rules(&self) -> GameRules {
        self.rules.rules()
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

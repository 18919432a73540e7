//! Game rule sets and presets.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How the type of each inserted piece is chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    Display,
    EnumString,
)]
#[serde(into = "u8", try_from = "PolicyRepr")]
#[strum(ascii_case_insensitive)]
pub enum NextTypePolicy {
    /// Cycle through the palette in order.
    #[default]
    Deterministic,
    /// Weighted random draw, wildcards included.
    Random,
    /// Reuse the removed piece's type; there is no queue.
    RemovedType,
}

impl From<NextTypePolicy> for u8 {
    fn from(policy: NextTypePolicy) -> Self {
        match policy {
            NextTypePolicy::Deterministic => 0,
            NextTypePolicy::Random => 1,
            NextTypePolicy::RemovedType => 2,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<PolicyRepr> for NextTypePolicy {
    type Error = String;

    fn try_from(repr: PolicyRepr) -> Result<Self, Self::Error> {
        match repr {
            PolicyRepr::Index(0) => Ok(NextTypePolicy::Deterministic),
            PolicyRepr::Index(1) => Ok(NextTypePolicy::Random),
            PolicyRepr::Index(2) => Ok(NextTypePolicy::RemovedType),
            PolicyRepr::Index(other) => Err(format!("Unknown next type policy index {}", other)),
            PolicyRepr::Name(name) => name
                .parse()
                .map_err(|_| format!("Unknown next type policy '{}'", name)),
        }
    }
}

/// Tunable rules of one game.
///
/// Serialized with PascalCase keys. Keys missing from the input take their
/// classic value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameRules {
    /// Relative weight of match-all pieces in random queues.
    pub match_all_weight: f32,
    /// Relative weight of match-none pieces in random queues.
    pub match_none_weight: f32,
    /// Weight shared evenly by the palette types in random queues.
    pub other_pieces_weight: f32,
    /// Match-all pieces grow when merged. Carried for front ends only.
    pub match_all_grows: bool,
    /// Choice of incoming piece types.
    pub next_type_policy: NextTypePolicy,
    /// Whether players may undo.
    pub allow_undo: bool,
    /// Front-end hint to preview the incoming piece.
    pub show_ghost_piece: bool,
}

impl GameRules {
    /// Deterministic palette cycling with undo.
    pub fn classic() -> Self {
        Self {
            match_all_weight: 0.0,
            match_none_weight: 0.0,
            other_pieces_weight: 100.0,
            match_all_grows: false,
            next_type_policy: NextTypePolicy::Deterministic,
            allow_undo: true,
            show_ghost_piece: false,
        }
    }

    /// The removed piece comes back with its own type.
    pub fn keep_same() -> Self {
        Self {
            next_type_policy: NextTypePolicy::RemovedType,
            ..Self::classic()
        }
    }

    /// Random pieces including wildcards, no undo.
    pub fn arcade() -> Self {
        Self {
            match_all_weight: 10.0,
            match_none_weight: 10.0,
            other_pieces_weight: 80.0,
            match_all_grows: true,
            next_type_policy: NextTypePolicy::Random,
            allow_undo: false,
            show_ghost_piece: true,
        }
    }

    /// Whether incoming types come from a queue.
    pub fn has_incoming_queue(&self) -> bool {
        self.next_type_policy != NextTypePolicy::RemovedType
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::classic()
    }
}

/// Named rule presets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RulesPreset {
    /// [`GameRules::classic`]
    #[default]
    Classic,
    /// [`GameRules::keep_same`]
    KeepSame,
    /// [`GameRules::arcade`]
    Arcade,
}

impl RulesPreset {
    /// The rules this preset names.
    pub fn rules(self) -> GameRules {
        match self {
            RulesPreset::Classic => GameRules::classic(),
            RulesPreset::KeepSame => GameRules::keep_same(),
            RulesPreset::Arcade => GameRules::arcade(),
        }
    }
}

impl From<RulesPreset> for GameRules {
    fn from(preset: RulesPreset) -> Self {
        preset.rules()
    }
}

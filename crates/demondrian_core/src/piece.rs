//! Piece types, piece values, and board occupant identities.

use derive_new::new;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Serialized index reserved for [`PieceType::MatchAll`].
pub const MATCH_ALL_INDEX: u32 = 1000;
/// Serialized index reserved for [`PieceType::MatchNone`].
pub const MATCH_NONE_INDEX: u32 = 1001;

/// The "colour" of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "PieceTypeRepr", from = "PieceTypeRepr")]
pub enum PieceType {
    /// Ordinary type identified by its index.
    Normal(u32),
    /// Wildcard matching every type except [`PieceType::MatchNone`].
    MatchAll,
    /// Wildcard matching nothing, itself included.
    MatchNone,
}

impl PieceType {
    /// Whether two types count as the same colour for merging and blocking.
    pub fn matches(&self, other: &PieceType) -> bool {
        match (self, other) {
            (PieceType::MatchNone, _) | (_, PieceType::MatchNone) => false,
            (PieceType::MatchAll, _) | (_, PieceType::MatchAll) => true,
            (PieceType::Normal(a), PieceType::Normal(b)) => a == b,
        }
    }

    /// `count` consecutive normal types starting at index `from`.
    pub fn range(from: u32, count: u32) -> Vec<PieceType> {
        (from..from + count).map(PieceType::Normal).collect()
    }

    /// Serialized index of this type.
    pub fn index(&self) -> u32 {
        match self {
            PieceType::Normal(index) => *index,
            PieceType::MatchAll => MATCH_ALL_INDEX,
            PieceType::MatchNone => MATCH_NONE_INDEX,
        }
    }

    /// Single-character glyph used by type grids.
    pub fn glyph(&self) -> String {
        match self {
            PieceType::Normal(index) => index.to_string(),
            PieceType::MatchAll => "A".to_string(),
            PieceType::MatchNone => "N".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct PieceTypeRepr {
    index: u32,
}

impl From<PieceType> for PieceTypeRepr {
    fn from(value: PieceType) -> Self {
        Self {
            index: value.index(),
        }
    }
}

impl From<PieceTypeRepr> for PieceType {
    fn from(value: PieceTypeRepr) -> Self {
        match value.index {
            MATCH_ALL_INDEX => PieceType::MatchAll,
            MATCH_NONE_INDEX => PieceType::MatchNone,
            index => PieceType::Normal(index),
        }
    }
}

impl std::fmt::Display for PieceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[T{}]", self.glyph())
    }
}

impl FromStr for PieceType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let inner = s
            .strip_prefix("[T")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| CoreError::parse(format!("not a piece type: '{}'", s)))?;
        match inner {
            "A" => Ok(PieceType::MatchAll),
            "N" => Ok(PieceType::MatchNone),
            digits => digits
                .parse::<u32>()
                .map(PieceType::Normal)
                .map_err(|e| CoreError::parse(format!("bad piece type '{}': {}", s, e))),
        }
    }
}

/// A typed square tile of power-of-two size.
///
/// `Piece` is a plain value: two equal pieces are interchangeable for
/// matching, but each placement on a board gets its own [`PieceId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Piece {
    /// Colour.
    #[serde(rename = "type")]
    pub kind: PieceType,
    /// Side length in cells.
    pub size: i32,
}

impl Piece {
    /// A 1×1 piece.
    pub fn unit(kind: PieceType) -> Self {
        Self { kind, size: 1 }
    }

    /// Same size and matching types.
    pub fn matches(&self, other: &Piece) -> bool {
        self.size == other.size && self.kind.matches(&other.kind)
    }

    /// The piece produced by merging four copies of this one.
    pub fn double_size(&self) -> Self {
        Self {
            kind: self.kind,
            size: self.size * 2,
        }
    }

    /// Whether `size` is a positive power of two.
    pub fn has_valid_size(&self) -> bool {
        self.size > 0 && (self.size & (self.size - 1)) == 0
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[P{}:{}]", self.kind, self.size)
    }
}

impl FromStr for Piece {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let inner = s
            .strip_prefix("[P")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| CoreError::parse(format!("not a piece: '{}'", s)))?;
        let (kind, size) = inner
            .rsplit_once(':')
            .ok_or_else(|| CoreError::parse(format!("not a piece: '{}'", s)))?;
        let size = size
            .parse::<i32>()
            .map_err(|e| CoreError::parse(format!("bad piece size '{}': {}", s, e)))?;
        Ok(Self::new(kind.parse()?, size))
    }
}

/// Identity of a piece placed on a board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("#{}", _0)]
pub struct PieceId(pub u64);

/// A piece together with its board identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Occupant {
    /// Board identity.
    pub id: PieceId,
    /// Piece value.
    #[serde(flatten)]
    pub piece: Piece,
}

impl Occupant {
    /// Value match, ignoring identity.
    pub fn matches(&self, other: &Occupant) -> bool {
        self.piece.matches(&other.piece)
    }
}

impl std::fmt::Display for Occupant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.piece, self.id)
    }
}

/// One cell of a serialized board: the covering piece, with its identity when
/// the board was written by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCell {
    /// Board identity; a fresh one is assigned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PieceId>,
    /// Piece value.
    #[serde(flatten)]
    pub piece: Piece,
}

impl From<Piece> for BoardCell {
    fn from(piece: Piece) -> Self {
        Self { id: None, piece }
    }
}

impl From<Occupant> for BoardCell {
    fn from(occupant: Occupant) -> Self {
        Self {
            id: Some(occupant.id),
            piece: occupant.piece,
        }
    }
}

/// The four occupants of an aligned 2×2 block, as used by merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecesSquare {
    /// Lower-left.
    pub p00: Occupant,
    /// Lower-right.
    pub p10: Occupant,
    /// Upper-left.
    pub p01: Occupant,
    /// Upper-right.
    pub p11: Occupant,
}

impl PiecesSquare {
    /// Occupants in anchor order: lower-left, lower-right, upper-left, upper-right.
    pub fn occupants(&self) -> [Occupant; 4] {
        [self.p00, self.p10, self.p01, self.p11]
    }

    /// Whether all four match the lower-left piece.
    pub fn all_match(&self) -> bool {
        self.p00.matches(&self.p10) && self.p00.matches(&self.p01) && self.p00.matches(&self.p11)
    }
}

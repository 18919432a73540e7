//! Grid coordinates and the four-way rotation model.
//!
//! Coordinates are always expressed in the local frame of a board's current
//! [`Orientation`]: row 0 is the edge gravity pulls toward.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Integer cell coordinate `(col, row)`.
///
/// Ordering is row-major: rows first, then columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Column, growing to the right.
    pub col: i32,
    /// Row, growing away from the gravity edge.
    pub row: i32,
}

impl Coord {
    /// Sentinel for "no coordinate".
    pub const INVALID: Coord = Coord { col: -1, row: -1 };

    /// The lower-left cell of every board.
    pub const ORIGIN: Coord = Coord { col: 0, row: 0 };

    /// Creates a coordinate.
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Returns `false` for the [`Coord::INVALID`] sentinel.
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Returns this coordinate shifted by `cols` and `rows`.
    pub fn offset(&self, cols: i32, rows: i32) -> Self {
        Self::new(self.col + cols, self.row + rows)
    }

    /// One row up.
    pub fn up(&self) -> Self {
        self.offset(0, 1)
    }

    /// One row down.
    pub fn down(&self) -> Self {
        self.offset(0, -1)
    }

    /// The four unit neighbours: below, above, left, right.
    pub fn neighbors(&self) -> [Coord; 4] {
        [
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }

    /// Anchors of the 2×2 block of `size`-sized squares starting here:
    /// self, right, up, up-right.
    pub fn square_coords(&self, size: i32) -> [Coord; 4] {
        [
            *self,
            self.offset(size, 0),
            self.offset(0, size),
            self.offset(size, size),
        ]
    }

    /// Every cell of the `size`×`size` square anchored at `origin`, row by row.
    pub fn square_range(origin: Coord, size: i32) -> impl Iterator<Item = Coord> {
        (0..size).flat_map(move |y| (0..size).map(move |x| origin.offset(x, y)))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[C{},{}]", self.col, self.row)
    }
}

impl FromStr for Coord {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let inner = s
            .strip_prefix("[C")
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| CoreError::parse(format!("not a coordinate: '{}'", s)))?;
        let (col, row) = inner
            .split_once(',')
            .ok_or_else(|| CoreError::parse(format!("not a coordinate: '{}'", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|e| CoreError::parse(format!("bad coordinate '{}': {}", s, e)))
        };
        Ok(Self::new(parse(col)?, parse(row)?))
    }
}

/// Active rotation of a board; defines where gravity pulls.
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
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(ascii_case_insensitive)]
pub enum Orientation {
    /// Unrotated.
    #[default]
    Top,
    /// Rotated a quarter turn clockwise.
    Right,
    /// Upside down.
    Bottom,
    /// Rotated a quarter turn counter-clockwise.
    Left,
}

impl Orientation {
    const ALL: [Orientation; 4] = [
        Orientation::Top,
        Orientation::Right,
        Orientation::Bottom,
        Orientation::Left,
    ];

    /// Position in the cycle `Top, Right, Bottom, Left`.
    pub fn index(self) -> u8 {
        match self {
            Orientation::Top => 0,
            Orientation::Right => 1,
            Orientation::Bottom => 2,
            Orientation::Left => 3,
        }
    }

    /// Orientation after one right rotation.
    pub fn right_of(self) -> Self {
        Self::ALL[(self.index() as usize + 1) % 4]
    }

    /// Orientation after one left rotation.
    pub fn left_of(self) -> Self {
        Self::ALL[(self.index() as usize + 3) % 4]
    }

    /// Quarter turns to the right needed to go from `from` to `self`.
    pub fn steps_from(self, from: Orientation) -> u8 {
        (self.index() + 4 - from.index()) % 4
    }
}

impl From<Orientation> for u8 {
    fn from(value: Orientation) -> Self {
        value.index()
    }
}

impl TryFrom<u8> for Orientation {
    type Error = CoreError;

    fn try_from(value: u8) -> CoreResult<Self> {
        Orientation::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| CoreError::parse(format!("invalid orientation index {}", value)))
    }
}

/// Direction of a single quarter turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum RotationDir {
    /// Counter-clockwise.
    Left,
    /// Clockwise.
    Right,
}

impl RotationDir {
    /// The opposite direction.
    pub fn inverse(self) -> Self {
        match self {
            RotationDir::Left => RotationDir::Right,
            RotationDir::Right => RotationDir::Left,
        }
    }

    /// Minimal rotations taking a board from `from` to `to`.
    pub fn steps(from: Orientation, to: Orientation) -> &'static [RotationDir] {
        const TABLE: [&[RotationDir]; 4] = [
            &[],
            &[RotationDir::Right],
            &[RotationDir::Right, RotationDir::Right],
            &[RotationDir::Left],
        ];
        TABLE[to.steps_from(from) as usize]
    }
}

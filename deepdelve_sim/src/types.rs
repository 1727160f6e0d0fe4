// Core types shared across the spatial engine.
//
// Defines grid coordinates (`Coord`), arena handles (`CellId`, `ActorId`),
// and the `Terrain` classification derived from a cell's solid/opaque pair.
// Coordinates derive `Serialize`/`Deserialize` so configs and test fixtures
// can carry them as JSON.
//
// A 2D point is a `Coord` with `z == 0`. `Coord::flat()` and the
// `From<(i32, i32)>` impl build one; nothing in this module ever drops a
// non-zero `z` when converting.
//
// See also: `grid.rs` for the arena that `CellId` indexes into, `cell.rs`
// for the per-slot data, `pathfinding.rs` for the distance heuristics built
// on top of `Coord`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in the grid. Each component is in cell units.
///
/// - X: east (positive) / west (negative)
/// - Y: south (positive) / north (negative), i.e. screen rows
/// - Z: depth layer; always 0 on a 2D grid
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// A point on the z = 0 layer.
    pub const fn flat(x: i32, y: i32) -> Self {
        Self { x, y, z: 0 }
    }

    /// Same x/y, different layer.
    pub const fn with_z(self, z: i32) -> Self {
        Self { z, ..self }
    }

    /// Translate by the given deltas. Components saturate at the `i32`
    /// limits, which are far off any grid.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
            .saturating_add(self.z.abs_diff(other.z))
    }

    /// Chebyshev distance: the number of king moves between two coordinates.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .max(self.y.abs_diff(other.y))
            .max(self.z.abs_diff(other.z))
    }

    /// Squared Euclidean distance, exact in integers. Saturates at
    /// `i64::MAX` for points near opposite `i32` limits.
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::flat(x, y)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Arena handles: plain integers, not pointers.
// ---------------------------------------------------------------------------

/// Index of a cell in its grid's flat cell array.
///
/// Stable for the lifetime of the grid: regeneration reinitializes cells in
/// place, so a `CellId` taken before `populate()` still names the same slot
/// afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to an actor owned by the actor subsystem.
///
/// Cells only store these (as occupant or corpse); they never resolve them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain state implied by a cell's `(solid, opaque)` pair. All four
/// combinations are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    /// Blocks movement and sight.
    Wall,
    /// Blocks movement, can be seen through (e.g. a grate).
    Obstacle,
    /// Walkable but blocks sight (e.g. hanging vines).
    Overhang,
    /// Walkable and transparent.
    Floor,
}

impl Terrain {
    pub fn from_flags(solid: bool, opaque: bool) -> Self {
        match (solid, opaque) {
            (true, true) => Self::Wall,
            (true, false) => Self::Obstacle,
            (false, true) => Self::Overhang,
            (false, false) => Self::Floor,
        }
    }

    pub fn is_solid(self) -> bool {
        matches!(self, Self::Wall | Self::Obstacle)
    }

    pub fn is_opaque(self) -> bool {
        matches!(self, Self::Wall | Self::Overhang)
    }
}

// Error type for the spatial engine.
//
// Only genuine failures live here. A lookup outside the grid is a miss
// (`Option::None`), and an A* search that exhausts its frontier returns an
// empty `Path`; neither is an error. What remains is either an exhausted
// spawn search (`NoOpenCell`) or a precondition violated by the caller
// (flood fill seeded on a solid or missing cell, bad dimensions, bad config).
//
// See also: `region.rs` and `grid.rs` for the call sites that produce these.

use crate::types::{CellId, Coord};

/// Errors raised by grid construction, configuration, spawning, and
/// partitioning.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// Every cell is solid or occupied, so an actor cannot be placed.
    #[error("no open, unoccupied cell found after {attempts} random attempts and a full scan")]
    NoOpenCell { attempts: u32 },

    /// A coordinate that should name a cell lies outside the grid.
    #[error("no cell at {0}")]
    MissingCell(Coord),

    /// A cell handle that does not belong to this grid.
    #[error("cell id {0:?} is out of range for this grid")]
    UnknownCell(CellId),

    /// A region flood fill was seeded on a solid cell.
    #[error("cannot flood a region from solid cell {0}")]
    SolidSeed(Coord),

    /// A region flood fill reached a cell whose neighbor cache is empty,
    /// which means the grid was never populated.
    #[error("neighbor cache for {0} has not been built; populate the grid first")]
    NeighborsNotBuilt(Coord),

    /// A grid needs at least one cell along every axis.
    #[error("invalid grid dimensions {width}x{height}x{depth}")]
    InvalidDimensions { width: u32, height: u32, depth: u32 },

    /// The border inset swallows the whole grid along some axis.
    #[error("border ({x}, {y}, {z}) leaves no interior in a {width}x{height}x{depth} grid")]
    InvalidBorder {
        x: u32,
        y: u32,
        z: u32,
        width: u32,
        height: u32,
        depth: u32,
    },

    /// A configuration value is out of its legal range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config JSON could not be parsed or written.
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpatialError>;

// deepdelve_sim — spatial core for a roguelike dungeon.
//
// This crate owns the level: a dense grid of cells, the cellular-automaton
// cave generator that fills it, connected-region analysis, field of view,
// and pathfinding. Actors, rendering, and input live elsewhere and talk to
// the grid through `CellId` / `ActorId` handles and the query functions
// below. Nothing here draws, reads input, or owns an actor.
//
// Module overview:
// - `types.rs`:       Coord, CellId, ActorId, Terrain.
// - `error.rs`:       SpatialError and the crate `Result` alias.
// - `config.rs`:      WorldConfig with grid, generation, spawn, and vision groups.
// - `cell.rs`:        Cell: terrain, fog-of-war, and residency flags plus the neighbor cache.
// - `grid.rs`:        Grid: the cell arena, coordinate lookup, viewport, open-cell search.
// - `generator.rs`:   Generator (seed, smooth, populate) and `build_world()`.
// - `region.rs`:      Region flood fill, `partition()`, isolated-pocket sealing.
// - `fov.rs`:         Recursive shadowcasting with facing cones and stance nudges.
// - `pathfinding.rs`: A* over the neighbor graph with selectable heuristics.
//
// **Critical constraint: determinism.** Every random draw goes through a
// caller-supplied `rand::Rng` (see `generator::world_rng()`), and every scan
// walks cells in index order. The FOV result is the only hashed collection;
// it is an unordered set and nothing iterates it to make decisions.

pub mod cell;
pub mod config;
pub mod error;
pub mod fov;
pub mod generator;
pub mod grid;
pub mod pathfinding;
pub mod region;
pub mod types;

pub use error::{Result, SpatialError};

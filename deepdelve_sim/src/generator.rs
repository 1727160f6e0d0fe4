// Procedural cave generation.
//
// Builds a level in three steps, each a method on `Generator`:
//
//   1. `generate(fill_percent)` seeds the solidity buffer. Interior cells get
//      one Bernoulli trial each; everything outside the border inset is
//      forced solid.
//   2. `smooth(iterations, threshold)` runs a cellular automaton over the
//      interior. Each pass reads `grid.solidity` and writes `grid.scratch`,
//      then swaps the two, so a pass only ever sees the previous pass.
//      More solid Moore neighbors than `threshold` makes a cell solid, fewer
//      makes it open, exactly `threshold` keeps it. Neighbors off the grid
//      count as solid.
//   3. `populate()` reinitializes every cell in place from the buffer
//      (`opaque = solid`), rebuilds the neighbor caches, and marks all cells
//      dirty for the renderer.
//
// `build_world()` runs the whole pipeline from a `WorldConfig`, optionally
// sealing every open pocket that is not part of the largest region on its
// layer.
//
// Generation never fails once the grid exists: extreme parameters just give
// an all-solid or all-open level.
//
// See also: `grid.rs` for the buffers being written, `region.rs` for the
// partitioning used by `seal_isolated_regions`, `config.rs` for
// `GenerationParams`.
//
// **Critical constraint: determinism.** All randomness comes from the `Rng`
// handed to the `Generator`. Cells are visited in index order, so a given
// seed and config always produce the same solidity layout.

use crate::config::{GenerationParams, WorldConfig};
use crate::error::Result;
use crate::grid::Grid;
use crate::region::{partition, seal_isolated_regions};
use crate::types::Coord;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// The reproducible random source used for world generation.
pub type WorldRng = ChaCha8Rng;

/// Seed a `WorldRng`. Two generators built from the same seed draw the same
/// sequence.
pub fn world_rng(seed: u64) -> WorldRng {
    WorldRng::seed_from_u64(seed)
}

/// Lifecycle of a `Generator`. Each step flips to `Generating` on entry and
/// back to `Idle` when it returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorState {
    Idle,
    Generating,
}

/// Cellular-automaton cave generator over an injected random source.
pub struct Generator<R: Rng> {
    rng: R,
    state: GeneratorState,
}

impl<R: Rng> Generator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            state: GeneratorState::Idle,
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Hand the random source back, e.g. to keep drawing from the same
    /// stream for spawning.
    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Seed the solidity buffer. `fill_percent` is clamped to [0, 1].
    pub fn generate(&mut self, grid: &mut Grid, fill_percent: f64) {
        self.state = GeneratorState::Generating;
        let p = if fill_percent.is_nan() {
            0.0
        } else {
            fill_percent.clamp(0.0, 1.0)
        };
        for i in 0..grid.len() {
            let coord = grid.coord_of(i);
            let solid = !grid.within_bounds(coord) || self.rng.random_bool(p);
            grid.solidity[i] = solid;
        }
        debug!(
            fill_percent = p,
            solid = grid.solidity.iter().filter(|&&s| s).count(),
            total = grid.len(),
            "seeded solidity"
        );
        self.state = GeneratorState::Idle;
    }

    /// Run `iterations` double-buffered smoothing passes.
    pub fn smooth(&mut self, grid: &mut Grid, iterations: u32, threshold: u32) {
        self.state = GeneratorState::Generating;
        for pass in 0..iterations {
            for i in 0..grid.len() {
                let coord = grid.coord_of(i);
                let next = if grid.within_bounds(coord) {
                    match count_solid_neighbors(grid, coord).cmp(&threshold) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => grid.solidity[i],
                    }
                } else {
                    true
                };
                grid.scratch[i] = next;
            }
            std::mem::swap(&mut grid.solidity, &mut grid.scratch);
            debug!(
                pass,
                solid = grid.solidity.iter().filter(|&&s| s).count(),
                "smoothing pass complete"
            );
        }
        self.state = GeneratorState::Idle;
    }

    /// Materialize cells from the solidity buffer. See `populate()`.
    pub fn populate(&mut self, grid: &mut Grid) {
        self.state = GeneratorState::Generating;
        populate(grid);
        self.state = GeneratorState::Idle;
    }

    /// Seed, smooth, and populate with the given parameters.
    pub fn run(&mut self, grid: &mut Grid, params: &GenerationParams) {
        self.generate(grid, params.fill_percent);
        self.smooth(grid, params.iterations, params.threshold);
        self.populate(grid);
    }
}

/// Reinitialize every cell from the grid's solidity buffer (`opaque =
/// solid`), rebuild neighbor caches, and mark every cell dirty.
///
/// Cells are reused in place, so `CellId`s held elsewhere stay valid.
pub fn populate(grid: &mut Grid) {
    grid.rebuild_cells();
    grid.mark_all_dirty();
    debug!(open = grid.open_cell_count(), "populated cells");
}

/// Build a complete level from config: allocate the grid, run the
/// generator, and optionally seal isolated pockets.
pub fn build_world<R: Rng>(config: &WorldConfig, rng: &mut R) -> Result<Grid> {
    config.validate()?;
    let mut grid = Grid::from_params(&config.grid)?;
    Generator::new(&mut *rng).run(&mut grid, &config.generation);

    if config.generation.seal_isolated_regions {
        let regions = partition(&grid, rng)?;
        let largest = regions.largest().map_or(0, |r| r.len());
        if largest < config.spawn.min_region_size {
            warn!(
                largest,
                min_region_size = config.spawn.min_region_size,
                "largest region is below the playable minimum"
            );
        }
        let sealed = seal_isolated_regions(&mut grid, &regions);
        debug!(sealed, regions = regions.len(), "sealed isolated regions");
    }

    info!(
        width = grid.width(),
        height = grid.height(),
        depth = grid.depth(),
        open = grid.open_cell_count(),
        "world built"
    );
    Ok(grid)
}

/// Build a level using the seed stored in the config.
pub fn build_seeded_world(config: &WorldConfig) -> Result<Grid> {
    let mut rng = world_rng(config.generation.seed);
    build_world(config, &mut rng)
}

/// Count solid cells in the Moore neighborhood of `center` (8 on a flat
/// grid, 26 in 3D), self excluded. Off-grid neighbors count as solid.
fn count_solid_neighbors(grid: &Grid, center: Coord) -> u32 {
    let dz_range = if grid.depth() == 1 { 0..=0 } else { -1..=1 };
    let mut count = 0;
    for dz in dz_range {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let solid = grid
                    .index_of(center.offset(dx, dy, dz))
                    .is_none_or(|i| grid.solidity[i]);
                if solid {
                    count += 1;
                }
            }
        }
    }
    count
}

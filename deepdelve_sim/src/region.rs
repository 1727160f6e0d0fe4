// Connected-region analysis.
//
// A `Region` is a maximal set of open cells joined by 8-connected steps
// through the cells' cached neighborhoods. Because the cache only spans a
// cell's own z layer, regions never cross layers.
//
// `partition()` covers every open cell with disjoint regions: it repeatedly
// picks a random still-unassigned open cell, floods breadth-first from it,
// and removes the flooded cells from the pool. The self entry in each
// neighborhood is absorbed by the visited check.
//
// Flooding from a solid seed, or reaching a cell whose neighbor cache was
// never built, is a caller bug and comes back as an error rather than an
// empty region.
//
// `seal_isolated_regions()` turns every region except the largest on each
// layer into wall, leaving one connected playable area per layer.
//
// See also: `generator.rs`, which calls the sealer from `build_world()`,
// `grid.rs` for `find_open_cell()`, which actor placement pairs with
// `Partition::region_of()` to check a spawn's surroundings.

use crate::error::{Result, SpatialError};
use crate::grid::Grid;
use crate::types::{CellId, Coord};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::info;

/// A maximal 8-connected set of open cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    cells: BTreeSet<CellId>,
}

impl Region {
    /// Flood the region containing `seed`.
    pub fn flood(grid: &Grid, seed: Coord) -> Result<Self> {
        let id = grid.id_of(seed).ok_or(SpatialError::MissingCell(seed))?;
        Self::from_cell(grid, id)
    }

    /// Flood the region containing the cell `seed`.
    pub fn from_cell(grid: &Grid, seed: CellId) -> Result<Self> {
        let mut visited = vec![false; grid.len()];
        flood_fill(grid, seed, &mut visited)
    }

    /// Number of cells. Never zero for a region built by flooding.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains(&id)
    }

    /// Member cells in index order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.iter().copied()
    }

    /// Member coordinates in index order.
    pub fn coords<'a>(&'a self, grid: &'a Grid) -> impl Iterator<Item = Coord> + 'a {
        self.cells.iter().map(|&id| grid.cell(id).position())
    }
}

/// Breadth-first fill from `seed` across open neighbors. `visited` is shared
/// with the caller so a partition can reuse one buffer for all regions.
fn flood_fill(grid: &Grid, seed: CellId, visited: &mut [bool]) -> Result<Region> {
    let start = grid.get(seed).ok_or(SpatialError::UnknownCell(seed))?;
    if start.is_solid() {
        return Err(SpatialError::SolidSeed(start.position()));
    }

    let mut cells = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited[seed.index()] = true;
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        let cell = grid.cell(current);
        if !cell.has_neighbors() {
            return Err(SpatialError::NeighborsNotBuilt(cell.position()));
        }
        cells.insert(current);
        for &next in cell.neighbors() {
            if visited[next.index()] || grid.cell(next).is_solid() {
                continue;
            }
            visited[next.index()] = true;
            queue.push_back(next);
        }
    }

    Ok(Region { cells })
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Disjoint regions covering every open cell of a grid.
#[derive(Clone, Debug)]
pub struct Partition {
    regions: Vec<Region>,
    /// `owner[cell]` = index into `regions`, `None` for solid cells.
    owner: Vec<Option<usize>>,
}

impl Partition {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<Region> {
        self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The region with the most cells. Ties go to the region found first.
    pub fn largest(&self) -> Option<&Region> {
        self.largest_index().map(|i| &self.regions[i])
    }

    fn largest_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, region) in self.regions.iter().enumerate() {
            if best.is_none_or(|b| region.len() > self.regions[b].len()) {
                best = Some(i);
            }
        }
        best
    }

    /// Regions with at least `min_size` cells, in discovery order.
    pub fn playable(&self, min_size: usize) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.len() >= min_size)
    }

    /// The region a cell belongs to, if the cell was open when partitioned.
    pub fn region_of(&self, id: CellId) -> Option<&Region> {
        self.owner
            .get(id.index())
            .copied()
            .flatten()
            .map(|i| &self.regions[i])
    }
}

/// Split all open cells of `grid` into connected regions. Seeds are drawn
/// at random from the unassigned pool.
pub fn partition<R: Rng>(grid: &Grid, rng: &mut R) -> Result<Partition> {
    let mut pool: Vec<CellId> = grid
        .cells()
        .iter()
        .filter(|c| !c.is_solid())
        .map(|c| c.id())
        .collect();
    let mut assigned = vec![false; grid.len()];
    let mut owner = vec![None; grid.len()];
    let mut regions = Vec::new();

    while !pool.is_empty() {
        let seed = pool.swap_remove(rng.random_range(0..pool.len()));
        if assigned[seed.index()] {
            continue;
        }
        let region = flood_fill(grid, seed, &mut assigned)?;
        for id in region.cells() {
            owner[id.index()] = Some(regions.len());
        }
        regions.push(region);
    }

    let partition = Partition { regions, owner };
    info!(
        regions = partition.len(),
        largest = partition.largest().map_or(0, Region::len),
        "partitioned open cells"
    );
    Ok(partition)
}

/// Turn every open cell outside the largest region of its z layer into
/// wall. Regions never span layers, so a 3D grid keeps one region per
/// layer. Returns the number of cells sealed. The partition is stale
/// afterwards.
pub fn seal_isolated_regions(grid: &mut Grid, partition: &Partition) -> usize {
    // Layer -> index of its largest region. Ties go to the region found first.
    let mut keep: BTreeMap<i32, usize> = BTreeMap::new();
    for (i, region) in partition.regions.iter().enumerate() {
        let Some(layer) = region.coords(grid).next().map(|c| c.z) else {
            continue;
        };
        let best = keep.entry(layer).or_insert(i);
        if region.len() > partition.regions[*best].len() {
            *best = i;
        }
    }

    let mut sealed = 0;
    for (i, region) in partition.regions.iter().enumerate() {
        if keep.values().any(|&k| k == i) {
            continue;
        }
        for id in region.cells() {
            let pos = grid.cell(id).position();
            grid.set_wall(pos);
            sealed += 1;
        }
    }
    sealed
}

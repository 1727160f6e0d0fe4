// Dense cell grid for a dungeon level.
//
// The grid owns two parallel flat arrays indexed by
// `z * width * height + y * width + x`:
// - `solidity: Vec<bool>`: the generator's working buffer (plus a scratch
//   twin for double-buffered smoothing), and
// - `cells: Vec<Cell>`: the materialized cells handed to collaborators.
// Both use the same linearization, and `set_solid()` writes both so they
// never drift apart after population.
//
// Lookups outside the grid are misses (`None`), not errors. A grid with
// `depth == 1` is a flat map and accepts any z, folding it onto layer 0.
//
// The `border` inset marks the interior that generation may randomize; every
// cell outside it is forced solid. The `position` is the top-left corner of
// the renderer's viewport, clamped so the viewport never leaves the grid.
//
// See also: `cell.rs` for per-slot data, `generator.rs` which fills
// `solidity` and calls `populate()`, `region.rs`, `fov.rs`, and
// `pathfinding.rs`, which all read cells through this arena.
//
// **Critical constraint: determinism.** Cell order is fixed by the
// linearization; every scan in the crate walks cells in index order.

use crate::cell::{Cell, Neighborhood};
use crate::config::{Border, GridParams};
use crate::error::{Result, SpatialError};
use crate::types::{CellId, Coord};
use rand::Rng;
use tracing::warn;

/// Dense 2D/3D cell grid.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    depth: u32,
    border: Border,
    viewport: (u32, u32),
    position: Coord,
    /// Generator-side solidity, same indexing as `cells`.
    pub(crate) solidity: Vec<bool>,
    /// Second buffer for smoothing; swapped with `solidity` each pass.
    pub(crate) scratch: Vec<bool>,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid of open cells. Neighbor caches are empty until
    /// `generator::populate()` runs. The border must leave at least one
    /// interior cell on each axis (z is ignored on a flat grid).
    pub fn new(width: u32, height: u32, depth: u32, border: Border) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(SpatialError::InvalidDimensions {
                width,
                height,
                depth,
            });
        }
        if !border.leaves_interior(width, height, depth) {
            return Err(SpatialError::InvalidBorder {
                x: border.x,
                y: border.y,
                z: border.z,
                width,
                height,
                depth,
            });
        }
        let total = (width as usize) * (height as usize) * (depth as usize);
        let mut grid = Self {
            width,
            height,
            depth,
            border,
            viewport: (width, height),
            position: Coord::default(),
            solidity: vec![false; total],
            scratch: vec![false; total],
            cells: Vec::with_capacity(total),
        };
        for i in 0..total {
            let coord = grid.coord_of(i);
            grid.cells.push(Cell::new(CellId(i as u32), coord));
        }
        Ok(grid)
    }

    /// Create a grid from config, with the configured viewport.
    pub fn from_params(params: &GridParams) -> Result<Self> {
        let mut grid = Self::new(params.width, params.height, params.depth, params.border)?;
        grid.viewport = params.viewport;
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn border(&self) -> Border {
        self.border
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn is_flat(&self) -> bool {
        self.depth == 1
    }

    // -----------------------------------------------------------------------
    // Addressing
    // -----------------------------------------------------------------------

    /// True iff `coord` lies inside the grid. On a flat grid any z is
    /// accepted.
    pub fn is_valid(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width
            && (coord.y as u32) < self.height
            && (self.is_flat() || (coord.z >= 0 && (coord.z as u32) < self.depth))
    }

    /// True iff `coord` lies inside the interior left after subtracting the
    /// border inset from both sides of every axis.
    pub fn within_bounds(&self, coord: Coord) -> bool {
        let inside = |v: i32, margin: u32, size: u32| {
            let v = i64::from(v);
            v >= i64::from(margin) && v < i64::from(size) - i64::from(margin)
        };
        inside(coord.x, self.border.x, self.width)
            && inside(coord.y, self.border.y, self.height)
            && (self.is_flat() || inside(coord.z, self.border.z, self.depth))
    }

    /// Flat index for a coordinate. Returns `None` if out of bounds.
    pub(crate) fn index_of(&self, coord: Coord) -> Option<usize> {
        if !self.is_valid(coord) {
            return None;
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let z = if self.is_flat() { 0 } else { coord.z as usize };
        Some(z * w * h + coord.y as usize * w + coord.x as usize)
    }

    /// Inverse of `index_of` for in-range indices.
    pub(crate) fn coord_of(&self, index: usize) -> Coord {
        let w = self.width as usize;
        let h = self.height as usize;
        let z = index / (w * h);
        let rem = index % (w * h);
        Coord::new((rem % w) as i32, (rem / w) as i32, z as i32)
    }

    /// Handle for the cell at `coord`, or `None` on a miss.
    pub fn id_of(&self, coord: Coord) -> Option<CellId> {
        self.index_of(coord).map(|i| CellId(i as u32))
    }

    // -----------------------------------------------------------------------
    // Cell access
    // -----------------------------------------------------------------------

    /// O(1) lookup by coordinate. `None` for anything outside the grid.
    pub fn lookup(&self, coord: Coord) -> Option<&Cell> {
        self.index_of(coord).map(|i| &self.cells[i])
    }

    pub fn lookup_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.index_of(coord).map(|i| &mut self.cells[i])
    }

    /// Cell by handle, or `None` for a handle from another grid.
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id.index())
    }

    /// Cell by handle. Panics on a handle from another grid; use `get()`
    /// when the handle is untrusted.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    /// All cells in index order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Cached neighbors of `id` that can be walked into: self and solid
    /// cells are skipped.
    pub fn open_neighbors(&self, id: CellId) -> impl Iterator<Item = CellId> + '_ {
        self.cell(id)
            .neighbors()
            .iter()
            .copied()
            .filter(move |&n| n != id && !self.cells[n.index()].solid)
    }

    /// The generator's solidity buffer, in index order.
    pub fn solidity(&self) -> &[bool] {
        &self.solidity
    }

    pub fn open_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.solid).count()
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Change solidity at `coord`, keeping the backing buffer in step.
    /// Returns `false` on a miss.
    pub fn set_solid(&mut self, coord: Coord, solid: bool) -> bool {
        let Some(i) = self.index_of(coord) else {
            return false;
        };
        self.solidity[i] = solid;
        let cell = &mut self.cells[i];
        if cell.solid != solid {
            cell.solid = solid;
            cell.mark_dirty();
        }
        true
    }

    /// Change opacity at `coord`. Returns `false` on a miss.
    pub fn set_opaque(&mut self, coord: Coord, opaque: bool) -> bool {
        let Some(cell) = self.lookup_mut(coord) else {
            return false;
        };
        if cell.opaque != opaque {
            cell.opaque = opaque;
            cell.mark_dirty();
        }
        true
    }

    /// Make `coord` a wall (solid and opaque). Returns `false` on a miss.
    pub fn set_wall(&mut self, coord: Coord) -> bool {
        self.set_solid(coord, true) && self.set_opaque(coord, true)
    }

    /// Reinitialize every cell from the solidity buffer and rebuild the
    /// neighbor caches. Cells are reused, never reallocated.
    pub(crate) fn rebuild_cells(&mut self) {
        for (cell, &solid) in self.cells.iter_mut().zip(self.solidity.iter()) {
            cell.reinitialize(solid);
        }
        self.build_neighbors();
    }

    /// Fill each cell's 3x3 same-layer neighborhood, self included.
    fn build_neighbors(&mut self) {
        for i in 0..self.cells.len() {
            let center = self.cells[i].position();
            let mut neighbors = Neighborhood::new();
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if let Some(id) = self.id_of(center.offset(dx, dy, 0)) {
                        neighbors.push(id);
                    }
                }
            }
            self.cells[i].neighbors = neighbors;
        }
    }

    /// Drain the dirty set: every cell whose cosmetic state changed since the
    /// last call, in index order.
    pub fn take_dirty(&mut self) -> Vec<CellId> {
        self.cells
            .iter_mut()
            .filter_map(|c| c.take_dirty().then_some(c.id()))
            .collect()
    }

    pub(crate) fn mark_all_dirty(&mut self) {
        for cell in &mut self.cells {
            cell.mark_dirty();
        }
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Find a cell that is open and unoccupied.
    ///
    /// Samples up to `max_attempts` random cells, then falls back to a scan
    /// in index order, so the error only comes back when no such cell
    /// exists anywhere.
    pub fn find_open_cell<R: Rng>(&self, rng: &mut R, max_attempts: u32) -> Result<CellId> {
        let total = self.cells.len();
        for _ in 0..max_attempts {
            let cell = &self.cells[rng.random_range(0..total)];
            if cell.is_vacant() {
                return Ok(cell.id());
            }
        }
        if let Some(cell) = self.cells.iter().find(|c| c.is_vacant()) {
            warn!(
                attempts = max_attempts,
                found = %cell.position(),
                "random open-cell sampling failed, fell back to scan"
            );
            return Ok(cell.id());
        }
        Err(SpatialError::NoOpenCell {
            attempts: max_attempts,
        })
    }

    // -----------------------------------------------------------------------
    // Viewport
    // -----------------------------------------------------------------------

    /// Top-left corner of the visible window.
    pub fn view_position(&self) -> Coord {
        self.position
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, columns: u32, rows: u32) {
        self.viewport = (columns, rows);
        self.set_view_position(self.position);
    }

    /// Move the viewport, clamping each axis to
    /// `[0, dimension - viewport_dimension]`.
    pub fn set_view_position(&mut self, position: Coord) {
        let max_x = self.width.saturating_sub(self.viewport.0) as i32;
        let max_y = self.height.saturating_sub(self.viewport.1) as i32;
        let max_z = self.depth as i32 - 1;
        self.position = Coord::new(
            position.x.clamp(0, max_x),
            position.y.clamp(0, max_y),
            position.z.clamp(0, max_z),
        );
    }

    pub fn scroll_view(&mut self, dx: i32, dy: i32) {
        self.set_view_position(self.position.offset(dx, dy, 0));
    }

    /// Put `focus` as close to the middle of the viewport as clamping allows.
    pub fn center_view_on(&mut self, focus: Coord) {
        let half_w = (self.viewport.0 / 2) as i32;
        let half_h = (self.viewport.1 / 2) as i32;
        self.set_view_position(focus.offset(-half_w, -half_h, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{populate, world_rng};

    fn open_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height, 1, Border::default()).unwrap();
        populate(&mut grid);
        grid
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            Grid::new(0, 4, 1, Border::default()),
            Err(SpatialError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn border_without_interior_is_rejected() {
        assert!(matches!(
            Grid::new(4, 9, 1, Border::uniform(2)),
            Err(SpatialError::InvalidBorder { width: 4, .. })
        ));
        assert!(matches!(
            Grid::new(9, 9, 2, Border::new(1, 1, 1)),
            Err(SpatialError::InvalidBorder { depth: 2, .. })
        ));
        // The z margin does not apply to a flat grid.
        assert!(Grid::new(9, 9, 1, Border::new(1, 1, 1)).is_ok());
    }

    #[test]
    fn indexing_is_row_major_by_layer() {
        let grid = Grid::new(10, 8, 6, Border::default()).unwrap();
        // index = z * w * h + y * w + x
        assert_eq!(grid.index_of(Coord::new(5, 3, 4)), Some(4 * 80 + 3 * 10 + 5));
        assert_eq!(grid.index_of(Coord::new(0, 0, 0)), Some(0));
        assert_eq!(grid.index_of(Coord::new(9, 7, 5)), Some(grid.len() - 1));
    }

    #[test]
    fn every_cell_reports_its_own_coordinate() {
        let grid = Grid::new(7, 5, 3, Border::default()).unwrap();
        for (i, cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell.id(), CellId(i as u32));
            assert_eq!(grid.index_of(cell.position()), Some(i));
            assert_eq!(grid.lookup(cell.position()).unwrap().id(), cell.id());
        }
    }

    #[test]
    fn out_of_bounds_lookup_is_a_miss() {
        let grid = Grid::new(4, 4, 2, Border::default()).unwrap();
        assert!(grid.lookup(Coord::new(-1, 0, 0)).is_none());
        assert!(grid.lookup(Coord::new(0, 4, 0)).is_none());
        assert!(grid.lookup(Coord::new(0, 0, 2)).is_none());
        assert!(grid.lookup(Coord::new(100, 100, 100)).is_none());
        assert!(grid.get(CellId(10_000)).is_none());
    }

    #[test]
    fn flat_grid_accepts_any_layer() {
        let grid = Grid::new(4, 4, 1, Border::default()).unwrap();
        assert!(grid.is_valid(Coord::new(1, 1, 7)));
        assert!(grid.is_valid(Coord::new(1, 1, -3)));
        assert_eq!(
            grid.lookup(Coord::new(1, 1, 7)).unwrap().position(),
            Coord::flat(1, 1)
        );
        let deep = Grid::new(4, 4, 2, Border::default()).unwrap();
        assert!(!deep.is_valid(Coord::new(1, 1, 7)));
    }

    #[test]
    fn within_bounds_excludes_border_ring() {
        let grid = Grid::new(6, 6, 1, Border::uniform(1)).unwrap();
        assert!(!grid.within_bounds(Coord::flat(0, 3)));
        assert!(!grid.within_bounds(Coord::flat(5, 3)));
        assert!(!grid.within_bounds(Coord::flat(3, 0)));
        assert!(grid.within_bounds(Coord::flat(1, 1)));
        assert!(grid.within_bounds(Coord::flat(4, 4)));
        // Flat grid: z border is ignored.
        assert!(grid.within_bounds(Coord::new(2, 2, 9)));
    }

    #[test]
    fn within_bounds_uses_z_border_in_3d() {
        let grid = Grid::new(6, 6, 4, Border::new(1, 1, 1)).unwrap();
        assert!(!grid.within_bounds(Coord::new(2, 2, 0)));
        assert!(grid.within_bounds(Coord::new(2, 2, 1)));
        assert!(grid.within_bounds(Coord::new(2, 2, 2)));
        assert!(!grid.within_bounds(Coord::new(2, 2, 3)));
    }

    #[test]
    fn neighbor_cache_includes_self_and_clips_edges() {
        let grid = open_grid(5, 5);
        let center = grid.lookup(Coord::flat(2, 2)).unwrap();
        assert_eq!(center.neighbors().len(), 9);
        assert!(center.neighbors().contains(&center.id()));
        assert_eq!(grid.lookup(Coord::flat(0, 0)).unwrap().neighbors().len(), 4);
        assert_eq!(grid.lookup(Coord::flat(2, 0)).unwrap().neighbors().len(), 6);
    }

    #[test]
    fn open_neighbors_skip_self_and_solid() {
        let mut grid = open_grid(5, 5);
        grid.set_solid(Coord::flat(1, 1), true);
        let id = grid.id_of(Coord::flat(2, 2)).unwrap();
        let open: Vec<_> = grid.open_neighbors(id).collect();
        assert_eq!(open.len(), 7);
        assert!(!open.contains(&id));
        assert!(!open.contains(&grid.id_of(Coord::flat(1, 1)).unwrap()));
    }

    #[test]
    fn set_solid_keeps_buffer_and_cell_in_step() {
        let mut grid = open_grid(4, 4);
        assert!(grid.set_solid(Coord::flat(2, 1), true));
        let i = grid.index_of(Coord::flat(2, 1)).unwrap();
        assert!(grid.solidity()[i]);
        assert!(grid.cells()[i].is_solid());
        assert!(!grid.set_solid(Coord::flat(9, 9), true));
    }

    #[test]
    fn find_open_cell_returns_vacant_cell() {
        let mut grid = open_grid(6, 6);
        for x in 0..6 {
            for y in 0..6 {
                if (x, y) != (4, 2) {
                    grid.set_solid(Coord::flat(x, y), true);
                }
            }
        }
        let mut rng = world_rng(3);
        // Even with zero random attempts the scan finds the single hole.
        let id = grid.find_open_cell(&mut rng, 0).unwrap();
        assert_eq!(grid.cell(id).position(), Coord::flat(4, 2));
        let id = grid.find_open_cell(&mut rng, 50).unwrap();
        assert_eq!(grid.cell(id).position(), Coord::flat(4, 2));
    }

    #[test]
    fn find_open_cell_skips_occupied() {
        let mut grid = open_grid(2, 1);
        grid.lookup_mut(Coord::flat(0, 0))
            .unwrap()
            .set_occupant(crate::types::ActorId(1));
        let mut rng = world_rng(11);
        let id = grid.find_open_cell(&mut rng, 20).unwrap();
        assert_eq!(grid.cell(id).position(), Coord::flat(1, 0));
    }

    #[test]
    fn find_open_cell_fails_when_full() {
        let mut grid = open_grid(3, 3);
        for x in 0..3 {
            for y in 0..3 {
                grid.set_solid(Coord::flat(x, y), true);
            }
        }
        let mut rng = world_rng(1);
        assert!(matches!(
            grid.find_open_cell(&mut rng, 10),
            Err(SpatialError::NoOpenCell { attempts: 10 })
        ));
    }

    #[test]
    fn view_position_is_clamped() {
        let mut grid = Grid::new(100, 60, 1, Border::default()).unwrap();
        grid.set_viewport(40, 20);
        grid.set_view_position(Coord::flat(-5, 100));
        assert_eq!(grid.view_position(), Coord::flat(0, 40));
        grid.scroll_view(200, -3);
        assert_eq!(grid.view_position(), Coord::flat(60, 37));
        grid.center_view_on(Coord::flat(50, 30));
        assert_eq!(grid.view_position(), Coord::flat(30, 20));
    }

    #[test]
    fn extreme_scrolls_clamp_without_overflow() {
        let mut grid = Grid::new(100, 60, 1, Border::default()).unwrap();
        grid.set_viewport(40, 20);
        grid.set_view_position(Coord::flat(3, 3));
        grid.scroll_view(i32::MAX, i32::MIN);
        assert_eq!(grid.view_position(), Coord::flat(60, 0));
        grid.center_view_on(Coord::flat(i32::MIN, i32::MAX));
        assert_eq!(grid.view_position(), Coord::flat(0, 40));
    }

    #[test]
    fn viewport_larger_than_grid_pins_to_origin() {
        let mut grid = Grid::new(10, 10, 1, Border::default()).unwrap();
        grid.set_viewport(40, 40);
        grid.scroll_view(5, 5);
        assert_eq!(grid.view_position(), Coord::flat(0, 0));
    }

    #[test]
    fn take_dirty_drains() {
        let mut grid = open_grid(3, 3);
        assert_eq!(grid.take_dirty().len(), 9);
        assert!(grid.take_dirty().is_empty());
        grid.set_solid(Coord::flat(1, 1), true);
        assert_eq!(grid.take_dirty(), vec![grid.id_of(Coord::flat(1, 1)).unwrap()]);
    }
}

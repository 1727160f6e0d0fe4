// A single grid slot.
//
// A `Cell` carries terrain flags (`solid`, `opaque`), fog-of-war flags
// (`seen`, `explored`), a cosmetic `bloody` flag, a `dirty` marker for the
// renderer, and a cached list of its 3x3 neighborhood on its own z layer.
// The neighborhood includes the cell itself: callers that want only the
// surrounding cells filter on `id` (see `Grid::open_neighbors()`).
//
// Occupant and corpse entries are `ActorId` handles written by the actor
// subsystem. The cell stores them and never resolves them.
//
// Cells are allocated once when their `Grid` is created and only ever
// reinitialized in place, so `CellId`s and cached neighbor lists stay valid
// across regeneration.
//
// See also: `grid.rs`, which owns the cell arena and is the only place that
// constructs or reinitializes cells.

use crate::types::{ActorId, CellId, Coord, Terrain};
use smallvec::SmallVec;

/// Up to nine handles: the 3x3 block centered on the cell, clipped at the
/// grid edge. Row-major order (north-west first), self included.
pub type Neighborhood = SmallVec<[CellId; 9]>;

#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    position: Coord,
    pub(crate) solid: bool,
    pub(crate) opaque: bool,
    bloody: bool,
    seen: bool,
    explored: bool,
    dirty: bool,
    pub(crate) neighbors: Neighborhood,
    occupant: Option<ActorId>,
    corpses: Vec<ActorId>,
}

impl Cell {
    pub(crate) fn new(id: CellId, position: Coord) -> Self {
        Self {
            id,
            position,
            solid: false,
            opaque: false,
            bloody: false,
            seen: false,
            explored: false,
            dirty: true,
            neighbors: Neighborhood::new(),
            occupant: None,
            corpses: Vec::new(),
        }
    }

    /// Reset every field for a freshly generated world, keeping the cell's
    /// identity and its allocation. The neighbor cache is cleared and must be
    /// rebuilt by the grid; the dirty flag is left to the caller.
    pub(crate) fn reinitialize(&mut self, solid: bool) {
        self.solid = solid;
        self.opaque = solid;
        self.bloody = false;
        self.seen = false;
        self.explored = false;
        self.neighbors.clear();
        self.occupant = None;
        self.corpses.clear();
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn position(&self) -> Coord {
        self.position
    }

    pub fn is_solid(&self) -> bool {
        self.solid
    }

    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    pub fn terrain(&self) -> Terrain {
        Terrain::from_flags(self.solid, self.opaque)
    }

    /// Open and nobody standing here.
    pub fn is_vacant(&self) -> bool {
        !self.solid && self.occupant.is_none()
    }

    /// Cached 3x3 neighborhood, self included. Empty until the grid is
    /// populated.
    pub fn neighbors(&self) -> &[CellId] {
        &self.neighbors
    }

    pub fn has_neighbors(&self) -> bool {
        !self.neighbors.is_empty()
    }

    // --- Fog of war ---

    pub fn is_seen(&self) -> bool {
        self.seen
    }

    pub fn is_explored(&self) -> bool {
        self.explored
    }

    /// Set the currently-visible flag. Seeing a cell also explores it.
    pub fn set_seen(&mut self, seen: bool) {
        if self.seen != seen {
            self.seen = seen;
            self.dirty = true;
        }
        if seen && !self.explored {
            self.explored = true;
            self.dirty = true;
        }
    }

    pub fn set_explored(&mut self, explored: bool) {
        if self.explored != explored {
            self.explored = explored;
            self.dirty = true;
        }
    }

    // --- Cosmetics ---

    pub fn is_bloody(&self) -> bool {
        self.bloody
    }

    pub fn set_bloody(&mut self, bloody: bool) {
        if self.bloody != bloody {
            self.bloody = bloody;
            self.dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag, returning whether it was set.
    pub(crate) fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    // --- Actor residency ---

    pub fn occupant(&self) -> Option<ActorId> {
        self.occupant
    }

    /// Record `actor` as standing here, returning whoever was recorded
    /// before.
    pub fn set_occupant(&mut self, actor: ActorId) -> Option<ActorId> {
        self.dirty = true;
        self.occupant.replace(actor)
    }

    pub fn clear_occupant(&mut self) -> Option<ActorId> {
        if self.occupant.is_some() {
            self.dirty = true;
        }
        self.occupant.take()
    }

    pub fn corpses(&self) -> &[ActorId] {
        &self.corpses
    }

    pub fn add_corpse(&mut self, actor: ActorId) {
        self.corpses.push(actor);
        self.dirty = true;
    }

    /// Remove one corpse entry. Returns `false` if it was not here.
    pub fn remove_corpse(&mut self, actor: ActorId) -> bool {
        match self.corpses.iter().position(|&c| c == actor) {
            Some(i) => {
                self.corpses.remove(i);
                self.dirty = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> Cell {
        Cell::new(CellId(0), Coord::flat(2, 3))
    }

    #[test]
    fn new_cell_is_open_floor() {
        let c = cell();
        assert_eq!(c.terrain(), Terrain::Floor);
        assert!(c.is_vacant());
        assert!(!c.has_neighbors());
        assert_eq!(c.position(), Coord::flat(2, 3));
    }

    #[test]
    fn reinitialize_ties_opacity_to_solidity() {
        let mut c = cell();
        c.reinitialize(true);
        assert_eq!(c.terrain(), Terrain::Wall);
        c.reinitialize(false);
        assert_eq!(c.terrain(), Terrain::Floor);
    }

    #[test]
    fn reinitialize_clears_state_but_keeps_identity() {
        let mut c = cell();
        c.set_seen(true);
        c.set_bloody(true);
        c.set_occupant(ActorId(9));
        c.add_corpse(ActorId(4));
        c.neighbors.push(CellId(0));
        c.reinitialize(false);
        assert!(!c.is_seen());
        assert!(!c.is_explored());
        assert!(!c.is_bloody());
        assert_eq!(c.occupant(), None);
        assert!(c.corpses().is_empty());
        assert!(!c.has_neighbors());
        assert_eq!(c.id(), CellId(0));
        assert_eq!(c.position(), Coord::flat(2, 3));
    }

    #[test]
    fn seeing_a_cell_explores_it() {
        let mut c = cell();
        c.take_dirty();
        c.set_seen(true);
        assert!(c.is_explored());
        assert!(c.take_dirty());
        c.set_seen(false);
        // Explored sticks after the cell leaves view.
        assert!(c.is_explored());
    }

    #[test]
    fn occupant_replace_and_clear() {
        let mut c = cell();
        assert_eq!(c.set_occupant(ActorId(1)), None);
        assert!(!c.is_vacant());
        assert_eq!(c.set_occupant(ActorId(2)), Some(ActorId(1)));
        assert_eq!(c.clear_occupant(), Some(ActorId(2)));
        assert!(c.is_vacant());
    }

    #[test]
    fn corpses_accumulate_and_remove() {
        let mut c = cell();
        c.add_corpse(ActorId(1));
        c.add_corpse(ActorId(2));
        assert_eq!(c.corpses(), &[ActorId(1), ActorId(2)]);
        assert!(c.remove_corpse(ActorId(1)));
        assert!(!c.remove_corpse(ActorId(1)));
        assert_eq!(c.corpses(), &[ActorId(2)]);
    }

    #[test]
    fn take_dirty_resets_flag() {
        let mut c = cell();
        assert!(c.take_dirty());
        assert!(!c.take_dirty());
        c.set_bloody(true);
        assert!(c.is_dirty());
    }
}

// A* pathfinding over the grid's neighbor graph.
//
// Standard A* with a `BinaryHeap` open set (min-heap via reversed
// ordering). Scores, predecessors, and the closed set live in `Vec`s indexed
// by `CellId`, so membership checks are O(1) and iteration order never
// depends on hashing.
//
// Edges come from each cell's cached 3x3 neighborhood, filtered to open
// cells (`Grid::open_neighbors()`). Every step costs 1, diagonal or not.
// The search stops when the goal is popped from the open set, not when it
// is first pushed.
//
// The heuristic is selectable. Only `Chebyshev` matches the uniform step
// cost exactly; the others can overestimate on diagonals, trading shortest
// paths for fewer expansions. `Euclidean` (truncated) is the default.
//
// A route that does not exist is not an error: the result is an empty
// `Path`, the same as for off-grid endpoints or an origin equal to its
// destination.
//
// See also: `grid.rs` for `open_neighbors()`, `region.rs` for the
// connectivity that decides whether a route can exist at all.
//
// **Critical constraint: determinism.** Heap ties are broken by insertion
// order (FIFO), so a fixed grid and endpoints always give the same path.

use crate::grid::Grid;
use crate::types::{CellId, Coord};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Distance estimate used to order the open set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Heuristic {
    Manhattan,
    Chebyshev,
    /// Chebyshev plus (sqrt 2 - 1) per diagonal, truncated.
    Octile,
    /// Straight-line distance, truncated.
    #[default]
    Euclidean,
}

impl Heuristic {
    pub fn estimate(self, from: Coord, to: Coord) -> u32 {
        let dx = from.x.abs_diff(to.x);
        let dy = from.y.abs_diff(to.y);
        let dz = from.z.abs_diff(to.z);
        match self {
            Heuristic::Manhattan => dx + dy + dz,
            Heuristic::Chebyshev => dx.max(dy).max(dz),
            Heuristic::Octile => {
                let (long, short) = (dx.max(dy), dx.min(dy));
                let diagonal = (std::f64::consts::SQRT_2 - 1.0) * f64::from(short);
                long + diagonal as u32 + dz
            }
            Heuristic::Euclidean => {
                let sq = [dx, dy, dz]
                    .iter()
                    .map(|&d| f64::from(d) * f64::from(d))
                    .sum::<f64>();
                sq.sqrt() as u32
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// A route from an origin to a destination. The origin itself is not
/// included; the destination is the last step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    /// Destination first, so the next step is always at the end.
    steps: Vec<CellId>,
}

impl Path {
    /// Number of steps left to walk.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// An empty path means "no route" (or nothing left to walk).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Remove and return the step nearest the origin.
    pub fn next_step(&mut self) -> Option<CellId> {
        self.steps.pop()
    }

    pub fn peek(&self) -> Option<CellId> {
        self.steps.last().copied()
    }

    pub fn destination(&self) -> Option<CellId> {
        self.steps.first().copied()
    }

    /// Remaining steps in travel order.
    pub fn iter(&self) -> impl Iterator<Item = CellId> + '_ {
        self.steps.iter().rev().copied()
    }

    /// Remaining steps as coordinates, in travel order.
    pub fn coords<'a>(&'a self, grid: &'a Grid) -> impl Iterator<Item = Coord> + 'a {
        self.iter().map(|id| grid.cell(id).position())
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    cell: CellId,
    f_score: u32,
    /// Push order, for FIFO tie-breaking.
    seq: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score, then earliest push, is
        // "greatest".
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Find a path between two coordinates. Off-grid endpoints give an empty
/// path.
pub fn find_path(grid: &Grid, origin: Coord, destination: Coord, heuristic: Heuristic) -> Path {
    match (grid.id_of(origin), grid.id_of(destination)) {
        (Some(start), Some(goal)) => astar(grid, start, goal, heuristic),
        _ => Path::default(),
    }
}

/// A* between two cells. Returns an empty path when `start == goal`, when
/// either handle is not from this grid, when the goal is solid, or when no
/// route exists.
pub fn astar(grid: &Grid, start: CellId, goal: CellId, heuristic: Heuristic) -> Path {
    let n = grid.len();
    if start == goal || start.index() >= n {
        return Path::default();
    }
    let Some(goal_cell) = grid.get(goal) else {
        return Path::default();
    };
    if goal_cell.is_solid() {
        return Path::default();
    }
    let target = goal_cell.position();
    let h = |id: CellId| heuristic.estimate(grid.cell(id).position(), target);

    // g_score[cell] = steps on the cheapest known route from start.
    let mut g_score = vec![u32::MAX; n];
    let mut came_from: Vec<Option<CellId>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut seq = 0u64;
    let mut expanded = 0usize;

    g_score[start.index()] = 0;
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        cell: start,
        f_score: h(start),
        seq,
    });

    while let Some(OpenEntry { cell: current, .. }) = open.pop() {
        if current == goal {
            let path = reconstruct_path(&came_from, start, goal);
            trace!(
                start = %grid.cell(start).position(),
                goal = %target,
                steps = path.len(),
                expanded,
                "path found"
            );
            return path;
        }

        let ci = current.index();
        if closed[ci] {
            continue;
        }
        closed[ci] = true;
        expanded += 1;

        let tentative_g = g_score[ci].saturating_add(1);
        for neighbor in grid.open_neighbors(current) {
            let ni = neighbor.index();
            if closed[ni] || tentative_g >= g_score[ni] {
                continue;
            }
            g_score[ni] = tentative_g;
            came_from[ni] = Some(current);
            seq += 1;
            open.push(OpenEntry {
                cell: neighbor,
                f_score: tentative_g.saturating_add(h(neighbor)),
                seq,
            });
        }
    }

    trace!(
        start = %grid.cell(start).position(),
        goal = %target,
        expanded,
        "no path"
    );
    Path::default()
}

/// Walk predecessors back from `goal`. The result is already destination
/// first, which is the order `Path` stores.
fn reconstruct_path(came_from: &[Option<CellId>], start: CellId, goal: CellId) -> Path {
    let mut steps = Vec::new();
    let mut current = goal;
    while current != start {
        steps.push(current);
        match came_from[current.index()] {
            Some(prev) => current = prev,
            None => break,
        }
    }
    Path { steps }
}

// Field of view via recursive shadowcasting.
//
// `compute_fov()` returns the set of coordinates visible from an origin
// within a Euclidean radius. The plane around the viewer is split into
// eight octants; each is scanned outward one row (Chebyshev distance band)
// at a time inside a slope window that starts as the whole octant `[1, 0]`.
// An opaque cell narrows the window: the part before it is handed to a
// recursive scan of the next row, and the current row continues in a
// blocked state until an open cell reopens the window after the shadow.
// Opaque cells themselves are visible. Coordinates off the grid are never
// reported and block like walls.
//
// The 3x3 block around the viewer (the viewer's own cell included) is
// always visible, regardless of walls or facing. So is the cast origin
// when a nudge moves it.
//
// A `ViewCone` restricts the result to cells whose bearing from the viewer
// is within half the span of the facing angle. Angles are degrees measured
// from +x toward +y (grid rows grow downward, so 90 faces "south"). A cone
// can also carry a nudge: the cast starts from a point shifted that many
// cells along the facing, which is how stances move the vantage point. If
// the shifted point is off the grid or opaque, the real origin is used.
//
// Nothing here writes to the grid. `reveal()` is the separate step that
// applies a visible set to the fog-of-war flags.
//
// See also: `config.rs` for `VisionParams`, `grid.rs` for lookups.
//
// The scan only reads the grid, so `compute_fov_many()` runs one cast per
// viewer in parallel over a shared `&Grid`.

use crate::config::VisionParams;
use crate::grid::Grid;
use crate::types::Coord;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

/// Coordinates visible from a viewer. Each coordinate is a cell's own
/// position, so on a flat grid z is always 0.
pub type VisibleSet = FxHashSet<Coord>;

// ---------------------------------------------------------------------------
// Viewer parameters
// ---------------------------------------------------------------------------

/// A facing restriction on the field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewCone {
    /// Degrees from +x toward +y. Any value is accepted and wrapped.
    pub facing: f64,
    /// Full angular width in degrees. 360 or more disables the check.
    pub span: f64,
    /// Cells to shift the cast origin along `facing`.
    pub nudge: i32,
}

impl ViewCone {
    pub fn new(facing: f64, span: f64) -> Self {
        Self {
            facing: wrap_degrees(facing),
            span,
            nudge: 0,
        }
    }

    pub fn with_nudge(mut self, nudge: i32) -> Self {
        self.nudge = nudge;
        self
    }

    fn is_full_circle(&self) -> bool {
        self.span >= 360.0
    }

    /// Whether the offset `(dx, dy)` from the viewer lies inside the cone.
    fn contains(&self, dx: i32, dy: i32) -> bool {
        if self.is_full_circle() {
            return true;
        }
        let bearing = wrap_degrees(f64::from(dy).atan2(f64::from(dx)).to_degrees());
        let deviation = ((bearing - wrap_degrees(self.facing) + 540.0) % 360.0 - 180.0).abs();
        deviation <= self.span / 2.0 + 1e-6
    }

    /// The cell offset of the nudged cast origin.
    fn nudge_offset(&self) -> (i32, i32) {
        let radians = self.facing.to_radians();
        let n = f64::from(self.nudge);
        ((n * radians.cos()).round() as i32, (n * radians.sin()).round() as i32)
    }
}

fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Viewer posture. Lower stances push the vantage point further forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
    Prone,
}

impl Stance {
    pub fn nudge(self, vision: &VisionParams) -> i32 {
        match self {
            Stance::Standing => vision.standing_nudge,
            Stance::Crouching => vision.crouching_nudge,
            Stance::Prone => vision.prone_nudge,
        }
    }

    /// A cone for this stance facing `facing` with the given span.
    pub fn cone(self, facing: f64, span: f64, vision: &VisionParams) -> ViewCone {
        ViewCone::new(facing, span).with_nudge(self.nudge(vision))
    }
}

/// One viewer's query, for batch evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FovRequest {
    pub origin: Coord,
    pub radius: i32,
    pub cone: Option<ViewCone>,
}

impl FovRequest {
    pub fn new(origin: Coord, radius: i32) -> Self {
        Self {
            origin,
            radius,
            cone: None,
        }
    }

    pub fn with_cone(mut self, cone: ViewCone) -> Self {
        self.cone = Some(cone);
        self
    }

    pub fn compute(&self, grid: &Grid) -> VisibleSet {
        cast(grid, self.origin, self.radius, self.cone.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Everything visible from `origin` within `radius`, in every direction.
/// An origin off the grid sees nothing.
pub fn compute_fov(grid: &Grid, origin: Coord, radius: i32) -> VisibleSet {
    cast(grid, origin, radius, None)
}

/// Like `compute_fov()`, restricted to a facing cone.
pub fn compute_fov_cone(grid: &Grid, origin: Coord, radius: i32, cone: &ViewCone) -> VisibleSet {
    cast(grid, origin, radius, Some(cone))
}

/// Evaluate many viewers against the same grid in parallel. Results come
/// back in request order.
pub fn compute_fov_many(grid: &Grid, requests: &[FovRequest]) -> Vec<VisibleSet> {
    requests.par_iter().map(|r| r.compute(grid)).collect()
}

/// Apply a visible set to the fog of war: clear `seen` on every cell, then
/// mark the visible cells seen (which also explores them). Returns how many
/// cells ended up seen.
pub fn reveal(grid: &mut Grid, visible: &VisibleSet) -> usize {
    for cell in grid.cells_mut() {
        cell.set_seen(false);
    }
    let mut seen = 0;
    for &coord in visible {
        if let Some(cell) = grid.lookup_mut(coord) {
            cell.set_seen(true);
            seen += 1;
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Shadowcasting
// ---------------------------------------------------------------------------

/// Octant transform: world offset = (col * xx + row * xy, col * yx + row * yy).
#[derive(Clone, Copy)]
struct Octant {
    xx: i32,
    xy: i32,
    yx: i32,
    yy: i32,
}

const OCTANTS: [Octant; 8] = [
    Octant { xx: 1, xy: 0, yx: 0, yy: 1 },
    Octant { xx: 0, xy: 1, yx: 1, yy: 0 },
    Octant { xx: 0, xy: -1, yx: 1, yy: 0 },
    Octant { xx: -1, xy: 0, yx: 0, yy: 1 },
    Octant { xx: -1, xy: 0, yx: 0, yy: -1 },
    Octant { xx: 0, xy: -1, yx: -1, yy: 0 },
    Octant { xx: 0, xy: 1, yx: -1, yy: 0 },
    Octant { xx: 1, xy: 0, yx: 0, yy: -1 },
];

impl Octant {
    fn transform(self, col: i32, row: i32) -> (i32, i32) {
        (
            col * self.xx + row * self.xy,
            col * self.yx + row * self.yy,
        )
    }
}

/// Per-cast state shared by every recursive call.
struct Caster<'a> {
    grid: &'a Grid,
    origin: Coord,
    radius: i32,
    cone: Option<&'a ViewCone>,
    visible: VisibleSet,
}

fn cast(grid: &Grid, origin: Coord, radius: i32, cone: Option<&ViewCone>) -> VisibleSet {
    let mut visible = VisibleSet::default();
    let Some(viewer) = grid.lookup(origin) else {
        return visible;
    };
    let origin = viewer.position();

    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(cell) = grid.lookup(origin.offset(dx, dy, 0)) {
                visible.insert(cell.position());
            }
        }
    }

    // Every in-grid cell is within this distance of any in-grid origin, so
    // larger radii add nothing.
    let extent = grid.width().saturating_add(grid.height()).min(i32::MAX as u32) as i32;
    let radius = radius.clamp(0, extent);

    // The scan starts one row out, so a nudged vantage cell needs adding
    // here like the ring does.
    let vantage = cast_origin(grid, origin, cone);
    visible.insert(vantage);

    let mut caster = Caster {
        grid,
        origin: vantage,
        radius,
        cone,
        visible,
    };
    for octant in OCTANTS {
        caster.scan(octant, 1, 1.0, 0.0);
    }
    caster.visible
}

/// The point the cast starts from: `origin` shifted by the cone's nudge,
/// or `origin` itself when the shifted point is unusable.
fn cast_origin(grid: &Grid, origin: Coord, cone: Option<&ViewCone>) -> Coord {
    let Some(cone) = cone.filter(|c| c.nudge != 0) else {
        return origin;
    };
    let (dx, dy) = cone.nudge_offset();
    match grid.lookup(origin.offset(dx, dy, 0)) {
        Some(cell) if !cell.is_opaque() => cell.position(),
        _ => origin,
    }
}

impl Caster<'_> {
    /// Scan rows `row..=radius` of one octant inside the slope window
    /// `[start, end]` (start >= end).
    fn scan(&mut self, octant: Octant, row: i32, mut start: f64, end: f64) {
        if start < end {
            return;
        }
        let radius_sq = i64::from(self.radius) * i64::from(self.radius);
        let mut next_start = start;

        for j in row..=self.radius {
            let dy = -j;
            let mut blocked = false;

            for dx in -j..=0 {
                let left = (f64::from(dx) - 0.5) / (f64::from(dy) + 0.5);
                let right = (f64::from(dx) + 0.5) / (f64::from(dy) - 0.5);
                if start < right {
                    continue;
                }
                if end > left {
                    break;
                }

                let (mx, my) = octant.transform(dx, dy);
                let cell = self.grid.lookup(self.origin.offset(mx, my, 0));
                if let Some(cell) = cell {
                    let dist_sq = i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy);
                    if dist_sq <= radius_sq && self.cone.is_none_or(|c| c.contains(mx, my)) {
                        self.visible.insert(cell.position());
                    }
                }
                let opaque = cell.is_none_or(|c| c.is_opaque());

                if blocked {
                    if opaque {
                        next_start = right;
                        continue;
                    }
                    blocked = false;
                    start = next_start;
                } else if opaque && j < self.radius {
                    blocked = true;
                    self.scan(octant, j + 1, start, left);
                    next_start = right;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

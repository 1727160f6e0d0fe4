// Data-driven world configuration.
//
// All tunable spatial parameters live in `WorldConfig`, loaded from JSON at
// world creation. Generation, spawning, and vision read from the config
// rather than from magic numbers, so cave shapes can be tuned without
// recompiling.
//
// Parameters are grouped into nested structs: `GridParams` (dimensions,
// border inset, viewport), `GenerationParams` (seed and cellular-automaton
// rules), `SpawnParams` (actor placement), and `VisionParams` (view radius
// and stance nudges). Named presets (`WorldConfig::cavern()`,
// `::open_field()`) tune the same parameter set for different map styles.
//
// See also: `generator.rs` for `build_world()`, which consumes the whole
// config, `fov.rs` for `Stance`, which reads `VisionParams`.
//
// **Critical constraint: determinism.** Together with the seed, the config
// fully determines the generated layout.

use crate::error::{Result, SpatialError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Margin forced solid on each side of each axis during generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub x: u32,
    pub y: u32,
    /// Ignored on 2D grids (`depth == 1`).
    pub z: u32,
}

impl Border {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Same margin on x and y, none on z.
    pub const fn uniform(margin: u32) -> Self {
        Self {
            x: margin,
            y: margin,
            z: 0,
        }
    }

    /// Whether a grid of the given size keeps at least one cell inside the
    /// margin on every axis. The z margin only counts when `depth > 1`.
    pub fn leaves_interior(&self, width: u32, height: u32, depth: u32) -> bool {
        let z_ok = depth == 1 || self.z.saturating_mul(2) < depth;
        self.x.saturating_mul(2) < width && self.y.saturating_mul(2) < height && z_ok
    }
}

/// Grid dimensions and viewport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridParams {
    pub width: u32,
    pub height: u32,
    /// 1 for a flat map.
    pub depth: u32,
    pub border: Border,
    /// Visible window (columns, rows) used to clamp the scroll position.
    pub viewport: (u32, u32),
}

/// Cellular-automaton cave generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Seed for `generator::world_rng()`.
    pub seed: u64,
    /// Probability (0.0–1.0) that an interior cell starts solid.
    pub fill_percent: f64,
    /// Number of smoothing passes.
    pub iterations: u32,
    /// A cell with more solid Moore neighbors than this becomes solid; fewer
    /// makes it open; exactly this many leaves it unchanged.
    pub threshold: u32,
    /// After smoothing, fill every open pocket outside the largest region.
    pub seal_isolated_regions: bool,
}

/// Actor placement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpawnParams {
    /// Random samples tried by `Grid::find_open_cell` before it scans.
    pub max_attempts: u32,
    /// Smallest region (in cells) considered playable.
    pub min_region_size: usize,
}

/// Field-of-view defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisionParams {
    /// Default view radius in cells.
    pub radius: i32,
    /// Forward nudge of the effective origin for each stance.
    pub standing_nudge: i32,
    pub crouching_nudge: i32,
    pub prone_nudge: i32,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level world configuration. Loaded from JSON, never mutated while a
/// world built from it is live.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldConfig {
    pub grid: GridParams,
    pub generation: GenerationParams,
    pub spawn: SpawnParams,
    pub vision: VisionParams,
}

impl WorldConfig {
    /// Winding caves: the default preset.
    pub fn cavern() -> Self {
        Self {
            grid: GridParams {
                width: 80,
                height: 50,
                depth: 1,
                border: Border::uniform(1),
                viewport: (60, 40),
            },
            generation: GenerationParams {
                seed: 0x5eed,
                fill_percent: 0.45,
                iterations: 5,
                threshold: 4,
                seal_isolated_regions: true,
            },
            spawn: SpawnParams {
                max_attempts: 1000,
                min_region_size: 200,
            },
            vision: VisionParams {
                radius: 8,
                standing_nudge: 0,
                crouching_nudge: 1,
                prone_nudge: 2,
            },
        }
    }

    /// Sparse pillars on mostly open ground.
    pub fn open_field() -> Self {
        let mut config = Self::cavern();
        config.generation.fill_percent = 0.2;
        config.generation.iterations = 2;
        config.generation.threshold = 5;
        config.generation.seal_isolated_regions = false;
        config.vision.radius = 12;
        config
    }

    /// Parse and validate a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make generation or spawning meaningless.
    pub fn validate(&self) -> Result<()> {
        let g = &self.grid;
        if g.width == 0 || g.height == 0 || g.depth == 0 {
            return Err(SpatialError::InvalidDimensions {
                width: g.width,
                height: g.height,
                depth: g.depth,
            });
        }
        let b = g.border;
        if !b.leaves_interior(g.width, g.height, g.depth) {
            return Err(SpatialError::InvalidBorder {
                x: b.x,
                y: b.y,
                z: b.z,
                width: g.width,
                height: g.height,
                depth: g.depth,
            });
        }
        let fill = self.generation.fill_percent;
        if !(0.0..=1.0).contains(&fill) {
            return Err(SpatialError::InvalidConfig(format!(
                "fill_percent {fill} is outside [0, 1]"
            )));
        }
        if self.vision.radius < 0 {
            return Err(SpatialError::InvalidConfig(format!(
                "vision radius {} is negative",
                self.vision.radius
            )));
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::cavern()
    }
}

// Test-only harness for end-to-end world pipeline tests.
//
// Wraps a real `Grid` built by `deepdelve_sim::generator::build_world()`
// together with the `WorldRng` that built it, and adds the small bits of
// actor bookkeeping the integration tests need: placing actors on open
// cells, looking around with a stance, and walking a path. All spatial
// logic goes through the same sim crate functions the game uses.
//
// See also: `tests/world_pipeline.rs` for the scenarios.

use deepdelve_sim::config::WorldConfig;
use deepdelve_sim::fov::{Stance, VisibleSet, compute_fov, compute_fov_cone, reveal};
use deepdelve_sim::generator::{WorldRng, build_world, world_rng};
use deepdelve_sim::grid::Grid;
use deepdelve_sim::pathfinding::{Heuristic, Path, find_path};
use deepdelve_sim::types::{ActorId, CellId, Coord};

/// Route tracing events to the test harness's captured output. Safe to call
/// from every test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A smaller cavern than the default preset, so debug-build tests stay
/// fast.
pub fn test_config(seed: u64) -> WorldConfig {
    let mut config = WorldConfig::cavern();
    config.grid.width = 48;
    config.grid.height = 32;
    config.grid.viewport = (24, 16);
    config.generation.seed = seed;
    config.spawn.min_region_size = 50;
    config
}

/// A generated level plus the random stream that produced it.
pub struct TestWorld {
    pub config: WorldConfig,
    pub grid: Grid,
    pub rng: WorldRng,
}

impl TestWorld {
    pub fn new(config: WorldConfig) -> Self {
        init_tracing();
        let mut rng = world_rng(config.generation.seed);
        let grid = build_world(&config, &mut rng).expect("build_world failed");
        Self { config, grid, rng }
    }

    /// Put `actor` on a random open, unoccupied cell.
    pub fn spawn(&mut self, actor: ActorId) -> CellId {
        let id = self
            .grid
            .find_open_cell(&mut self.rng, self.config.spawn.max_attempts)
            .expect("no room to spawn");
        self.grid.cell_mut(id).set_occupant(actor);
        id
    }

    pub fn position(&self, id: CellId) -> Coord {
        self.grid.cell(id).position()
    }

    /// Everything `at` can see at the configured radius, in all directions.
    pub fn look(&self, at: CellId) -> VisibleSet {
        compute_fov(&self.grid, self.position(at), self.config.vision.radius)
    }

    /// A stance-adjusted cone look.
    pub fn look_toward(&self, at: CellId, stance: Stance, facing: f64, span: f64) -> VisibleSet {
        let cone = stance.cone(facing, span, &self.config.vision);
        compute_fov_cone(&self.grid, self.position(at), self.config.vision.radius, &cone)
    }

    /// Look from `at` and apply the result to the fog of war.
    pub fn look_and_reveal(&mut self, at: CellId) -> usize {
        let visible = self.look(at);
        reveal(&mut self.grid, &visible)
    }

    pub fn route(&self, from: CellId, to: CellId) -> Path {
        find_path(
            &self.grid,
            self.position(from),
            self.position(to),
            Heuristic::default(),
        )
    }

    /// Move the occupant of `from` up to `max_steps` steps along `path`.
    /// Returns the cell it ends on; unwalked steps stay in `path`.
    pub fn walk(&mut self, from: CellId, path: &mut Path, max_steps: usize) -> CellId {
        let mut at = from;
        for _ in 0..max_steps {
            let Some(next) = path.next_step() else {
                break;
            };
            let actor = self
                .grid
                .cell_mut(at)
                .clear_occupant()
                .expect("walker vanished");
            self.grid.cell_mut(next).set_occupant(actor);
            at = next;
        }
        at
    }
}

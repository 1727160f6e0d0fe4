// End-to-end tests for the world pipeline.
//
// Each test builds a real level through `build_world()` and drives it the
// way the actor subsystem does: spawn on an open cell, look around, reveal
// the fog of war, and walk a path. The properties checked here span
// modules (generation feeds partitioning feeds pathfinding) and so do not
// fit in any one crate module's unit tests.

use deepdelve_sim::config::{Border, WorldConfig};
use deepdelve_sim::fov::{FovRequest, Stance, compute_fov_many};
use deepdelve_sim::generator::{build_seeded_world, build_world, world_rng};
use deepdelve_sim::pathfinding::{Heuristic, find_path};
use deepdelve_sim::region::{Region, partition};
use deepdelve_sim::types::{ActorId, Coord};
use deepdelve_tests::{TestWorld, init_tracing, test_config};
use rand::Rng;

const SEEDS: [u64; 4] = [1, 7, 0xdead, 0x5eed];

#[test]
fn spawn_look_and_walk() {
    let mut world = TestWorld::new(test_config(7));
    let hero = world.spawn(ActorId(1));
    let goblin = world.spawn(ActorId(2));
    assert_ne!(hero, goblin);
    assert_eq!(world.grid.cell(hero).occupant(), Some(ActorId(1)));

    let seen = world.look_and_reveal(hero);
    assert!(seen >= 1);
    let here = world.grid.cell(hero);
    assert!(here.is_seen() && here.is_explored());

    // Sealing leaves one region, so any two open cells are connected.
    let mut path = world.route(hero, goblin);
    assert!(!path.is_empty());
    assert_eq!(path.destination(), Some(goblin));

    // Step next to the goblin, not onto it.
    let steps = path.len() - 1;
    let end = world.walk(hero, &mut path, steps);
    assert_eq!(path.len(), 1);
    assert_eq!(path.peek(), Some(goblin));
    assert_eq!(world.grid.cell(end).occupant(), Some(ActorId(1)));
    assert_eq!(world.grid.cell(goblin).occupant(), Some(ActorId(2)));
    assert_eq!(world.position(end).chebyshev_distance(world.position(goblin)), 1);
    if end != hero {
        assert_eq!(world.grid.cell(hero).occupant(), None);
    }
}

#[test]
fn same_seed_reproduces_the_whole_session() {
    let run = || {
        let mut world = TestWorld::new(test_config(0xdead));
        let a = world.spawn(ActorId(1));
        let b = world.spawn(ActorId(2));
        let path: Vec<_> = world.route(a, b).iter().collect();
        (world.grid.solidity().to_vec(), a, b, path)
    };
    assert_eq!(run(), run());
}

#[test]
fn sealed_worlds_have_one_region_and_a_solid_border() {
    init_tracing();
    for seed in SEEDS {
        let grid = build_seeded_world(&test_config(seed)).unwrap();
        for cell in grid.cells() {
            if !grid.within_bounds(cell.position()) {
                assert!(cell.is_solid(), "seed {seed}: border {} open", cell.position());
            }
            assert_eq!(cell.is_opaque(), cell.is_solid());
        }
        let mut rng = world_rng(seed);
        let parts = partition(&grid, &mut rng).unwrap();
        assert!(parts.len() <= 1, "seed {seed}: {} regions", parts.len());
    }
}

#[test]
fn unsealed_paths_exist_exactly_within_regions() {
    init_tracing();
    let mut config = WorldConfig::open_field();
    config.grid.width = 40;
    config.grid.height = 24;
    config.generation.fill_percent = 0.5;
    config.generation.seal_isolated_regions = false;
    let grid = build_seeded_world(&config).unwrap();

    let mut rng = world_rng(3);
    let parts = partition(&grid, &mut rng).unwrap();
    let covered: usize = parts.regions().iter().map(Region::len).sum();
    assert_eq!(covered, grid.open_cell_count());

    let open: Vec<_> = grid
        .cells()
        .iter()
        .filter(|c| !c.is_solid())
        .map(|c| c.id())
        .collect();
    assert!(open.len() > 2);
    for _ in 0..40 {
        let a = open[rng.random_range(0..open.len())];
        let b = open[rng.random_range(0..open.len())];
        if a == b {
            continue;
        }
        let same_region = parts.region_of(a).is_some_and(|r| r.contains(b));
        let path = find_path(
            &grid,
            grid.cell(a).position(),
            grid.cell(b).position(),
            Heuristic::Chebyshev,
        );
        assert_eq!(!path.is_empty(), same_region);
    }
}

#[test]
fn config_json_drives_the_build() {
    let config = test_config(99);
    let json = config.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["grid"]["width"], 48);

    let restored = WorldConfig::from_json(&json).unwrap();
    let a = build_seeded_world(&config).unwrap();
    let b = build_seeded_world(&restored).unwrap();
    assert_eq!(a.solidity(), b.solidity());
}

#[test]
fn batch_fov_matches_each_actor() {
    let mut world = TestWorld::new(test_config(1));
    let actors: Vec<_> = (0..6).map(|i| world.spawn(ActorId(i))).collect();
    let radius = world.config.vision.radius;
    let requests: Vec<_> = actors
        .iter()
        .map(|&id| FovRequest::new(world.position(id), radius))
        .collect();
    let batch = compute_fov_many(&world.grid, &requests);
    for (&id, visible) in actors.iter().zip(&batch) {
        assert_eq!(visible, &world.look(id));
        assert!(visible.contains(&world.position(id)));
    }
}

#[test]
fn stance_cone_is_a_subset_of_a_full_look_from_the_same_vantage() {
    let mut world = TestWorld::new(test_config(0x5eed));
    let scout = world.spawn(ActorId(1));
    let origin = world.position(scout);
    let full = world.look(scout);
    let cone = world.look_toward(scout, Stance::Standing, 0.0, 90.0);
    // Standing has no nudge, so the cone casts from the same point.
    assert!(cone.is_subset(&full));
    for dy in -1..=1 {
        for dx in -1..=1 {
            let c = origin.offset(dx, dy, 0);
            if world.grid.is_valid(c) {
                assert!(cone.contains(&c));
            }
        }
    }
}

#[test]
fn regions_stay_on_their_layer_in_3d() {
    init_tracing();
    let mut config = test_config(5);
    config.grid.width = 20;
    config.grid.height = 16;
    config.grid.depth = 4;
    config.grid.border = Border::new(1, 1, 1);
    config.generation.fill_percent = 0.3;
    config.generation.threshold = 16;
    config.generation.seal_isolated_regions = false;
    let mut rng = world_rng(config.generation.seed);
    let grid = build_world(&config, &mut rng).unwrap();

    for cell in grid.cells() {
        let z = cell.position().z;
        if z == 0 || z == 3 {
            assert!(cell.is_solid());
        }
    }
    let parts = partition(&grid, &mut rng).unwrap();
    for region in parts.regions() {
        let mut layers = region.coords(&grid).map(|c: Coord| c.z);
        let first = layers.next().unwrap();
        assert!(layers.all(|z| z == first));
    }
}

#[test]
fn sealing_a_3d_world_keeps_every_layer_playable() {
    init_tracing();
    let mut config = test_config(5);
    config.grid.width = 20;
    config.grid.height = 16;
    config.grid.depth = 4;
    config.grid.border = Border::new(1, 1, 1);
    config.generation.fill_percent = 0.3;
    config.generation.threshold = 16;
    let mut rng = world_rng(config.generation.seed);
    let grid = build_world(&config, &mut rng).unwrap();

    let parts = partition(&grid, &mut rng).unwrap();
    let mut layers: Vec<i32> = parts
        .regions()
        .iter()
        .map(|r| r.coords(&grid).next().unwrap().z)
        .collect();
    layers.sort_unstable();
    // Both interior layers survive, each as a single region.
    assert_eq!(layers, vec![1, 2]);
}

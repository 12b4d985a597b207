use seedgen_core::{
    block::{generate_blocks, Block},
    config::{BlockGeneratorConfig, RealizationSeedConfig, SeedGenerationConfig},
    error::SeedError,
    seed::{RealizationSeeder, SeedDeriver},
};
use std::collections::HashSet;

fn layout() -> Vec<Block> {
    generate_blocks(&BlockGeneratorConfig {
        target_total_events: 5_000,
        blocks_per_realization: 20,
        target_events_per_block: 10,
        seed: 1234,
    })
    .expect("layout")
}

fn deriver(plugins: &[&str]) -> SeedDeriver {
    SeedDeriver::new(&SeedGenerationConfig {
        initial_event_seed: 1111,
        initial_realization_seed: 2222,
        plugins: plugins.iter().map(|p| p.to_string()).collect(),
    })
    .expect("deriver")
}

#[test]
fn two_plugins_get_two_distinct_seeds() {
    let blocks = layout();
    let assignment = deriver(&["hydrology", "hydraulics"])
        .compute_one(42, &blocks)
        .expect("event 42");

    assert_eq!(assignment.event_index, 42);
    assert_eq!(assignment.plugin_seeds.len(), 2);
    assert_ne!(
        assignment.plugin_seeds["hydrology"],
        assignment.plugin_seeds["hydraulics"]
    );
}

#[test]
fn compute_one_reports_the_containing_block() {
    let blocks = layout();
    let d = deriver(&["hydrology"]);
    for b in blocks.iter().filter(|b| !b.is_empty()).step_by(37) {
        let a = d.compute_one(b.event_end, &blocks).expect("lookup");
        assert_eq!(a.realization_index, b.realization_index);
        assert_eq!(a.block_index, b.block_index);
    }
}

#[test]
fn uncovered_event_is_a_lookup_error() {
    let blocks = layout();
    let past_end = blocks.last().expect("blocks").event_end + 1;
    let d = deriver(&["hydrology"]);

    for e in [0, -3, past_end] {
        match d.compute_one(e, &blocks) {
            Err(SeedError::EventNotFound { event_index }) => assert_eq!(event_index, e),
            other => panic!("expected EventNotFound for {e}, got {other:?}"),
        }
    }
    assert!(matches!(
        d.compute_one(1, &[]),
        Err(SeedError::EventNotFound { event_index: 1 })
    ));
}

#[test]
fn compute_all_matches_compute_one_for_every_event() {
    let blocks = layout();
    let d = deriver(&["hydrology", "hydraulics", "consequences"]);
    let all = d.compute_all(&blocks);

    let last_event = blocks.last().expect("blocks").event_end;
    assert_eq!(all.len() as i64, last_event);

    for (i, assignment) in all.iter().enumerate() {
        let e = i as i64 + 1;
        assert_eq!(assignment.event_index, e);
        assert_eq!(*assignment, d.compute_one(e, &blocks).expect("single"));
    }
}

#[test]
fn compute_all_skips_empty_blocks() {
    let blocks = vec![
        Block::new(1, 1, 1, 2),
        Block::new(1, 2, 3, 0),
        Block::new(2, 1, 3, 0),
        Block::new(2, 2, 3, 1),
    ];
    let all = deriver(&["hydrology"]).compute_all(&blocks);
    let positions: Vec<(u32, u32, i64)> = all
        .iter()
        .map(|a| (a.realization_index, a.block_index, a.event_index))
        .collect();
    assert_eq!(positions, vec![(1, 1, 1), (1, 1, 2), (2, 2, 3)]);
}

#[test]
fn seeds_do_not_collide_across_events_plugins_and_realizations() {
    let blocks = layout();
    let plugins = ["hydrology", "hydraulics", "consequences", "lifeloss"];
    let all = deriver(&plugins).compute_all(&blocks);

    let mut seen = HashSet::new();
    for a in &all {
        for seed in a.plugin_seeds.values() {
            assert!(seen.insert(*seed), "seed {seed} repeated at event {}", a.event_index);
        }
    }
    assert_eq!(seen.len(), all.len() * plugins.len());
}

#[test]
fn same_event_in_different_realizations_differs() {
    // Two layouts that put event 5 in different realizations.
    let one = vec![Block::new(1, 1, 1, 10)];
    let two = vec![Block::new(1, 1, 1, 4), Block::new(2, 1, 5, 6)];
    let d = deriver(&["hydrology"]);
    let a = d.compute_one(5, &one).expect("one");
    let b = d.compute_one(5, &two).expect("two");
    assert_ne!(a.plugin_seeds["hydrology"], b.plugin_seeds["hydrology"]);
}

#[test]
fn seed_roots_change_every_seed() {
    let blocks = layout();
    let base = deriver(&["hydrology"]).compute_one(10, &blocks).expect("base");

    let mut other_event_root = SeedGenerationConfig::default_test();
    other_event_root.plugins = vec!["hydrology".into()];
    other_event_root.initial_event_seed = 1112;
    other_event_root.initial_realization_seed = 2222;
    let moved = SeedDeriver::new(&other_event_root)
        .expect("deriver")
        .compute_one(10, &blocks)
        .expect("moved");
    assert_ne!(base.plugin_seeds, moved.plugin_seeds);
}

#[test]
fn assignment_serializes_plugin_map() {
    let blocks = layout();
    let a = deriver(&["hydrology", "hydraulics"]).compute_one(3, &blocks).expect("event 3");
    let json = serde_json::to_value(&a).expect("encode");
    assert_eq!(json["event_index"], 3);
    assert!(json["plugin_seeds"]["hydrology"].is_i64());
    assert!(json["plugin_seeds"]["hydraulics"].is_i64());
}

// ── Realization-level path ─────────────────────────────────────

#[test]
fn realization_seeder_groups_events_by_fixed_length() {
    let seeder = RealizationSeeder::new(&RealizationSeedConfig::default_test()).expect("seeder");
    assert_eq!(seeder.realization_of(1).expect("event 1"), 1);
    assert_eq!(seeder.realization_of(100).expect("event 100"), 1);
    assert_eq!(seeder.realization_of(101).expect("event 101"), 2);

    let a = seeder.compute_for_realization(150).expect("event 150");
    assert_eq!(a.realization_index, 2);
    assert_eq!(a.block_index, 1);
    assert_eq!(a.plugin_seeds.len(), 2);
}

#[test]
fn realization_seeder_matches_block_path_for_equivalent_layout() {
    let config = RealizationSeedConfig::default_test();
    let seeder = RealizationSeeder::new(&config).expect("seeder");
    let blocks = vec![Block::new(1, 1, 1, 100), Block::new(2, 1, 101, 100)];
    let d = SeedDeriver::new(&config.seeds).expect("deriver");

    for e in [1, 57, 100, 101, 200] {
        assert_eq!(
            seeder.compute_for_realization(e).expect("realization path"),
            d.compute_one(e, &blocks).expect("block path")
        );
    }
}

#[test]
fn realization_seeder_without_length_uses_one_realization() {
    let mut config = RealizationSeedConfig::default_test();
    config.events_per_realization = None;
    let seeder = RealizationSeeder::new(&config).expect("seeder");
    assert_eq!(seeder.compute_for_realization(1_000_000).expect("event").realization_index, 1);
}

#[test]
fn realization_seeder_rejects_non_positive_events() {
    let seeder = RealizationSeeder::new(&RealizationSeedConfig::default_test()).expect("seeder");
    assert!(matches!(
        seeder.compute_for_realization(0),
        Err(SeedError::Configuration { field: "event_index", .. })
    ));
}

#[test]
fn realization_index_overflow_is_rejected() {
    let mut config = RealizationSeedConfig::default_test();
    config.events_per_realization = Some(1);
    let seeder = RealizationSeeder::new(&config).expect("seeder");

    let last = u32::MAX as i64;
    assert_eq!(seeder.realization_of(last).expect("last realization"), u32::MAX);
    assert!(matches!(
        seeder.compute_for_realization(last + 1),
        Err(SeedError::Configuration { field: "event_index", .. })
    ));
}

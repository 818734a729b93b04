//! Checks the shipped `content/tuning.json` against the code defaults.

use pilot_world::{build_world, load_tuning, Tuning};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::OnceLock;

/// Integration tests run from the crate directory, so go up two levels.
fn content_dir() -> String {
    let manifest = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    format!("{manifest}/../../content")
}

fn shipped_tuning() -> &'static Tuning {
    static TUNING: OnceLock<Tuning> = OnceLock::new();
    TUNING.get_or_init(|| load_tuning(&content_dir()).expect("shipped tuning should load"))
}

#[test]
fn test_shipped_tuning_loads() {
    let _tuning = shipped_tuning();
}

#[test]
fn test_shipped_tuning_matches_defaults() {
    assert_eq!(
        shipped_tuning(),
        &Tuning::default(),
        "content/tuning.json and the Default impls have drifted apart"
    );
}

#[test]
fn test_shipped_world_generates_for_many_seeds() {
    let tuning = shipped_tuning();
    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        build_world(&tuning.world, &mut rng)
            .unwrap_or_else(|err| panic!("seed {seed} failed to generate: {err:#}"));
    }
}

#[test]
fn test_shipped_teams_have_room_to_grow() {
    let tuning = shipped_tuning();
    let strategy = &tuning.team.strategy;
    assert!(
        (tuning.world.craft_per_team as u32) < strategy.goal_ships,
        "teams should start below the fleet goal"
    );
    assert!(tuning.physics.ship_cost < tuning.world.deposit_resources[1] * 2.0);
}

use pilot_control::{EvolutionConfig, EvolutionEngine, SharedEvolution};
use pilot_world::{evolve_if_ready, load_knowledge, play_game, save_knowledge, Game, Tuning};

fn engine(config: EvolutionConfig) -> SharedEvolution {
    EvolutionEngine::fresh(config, 11).into_shared()
}

#[test]
fn test_same_seed_same_outcome() {
    let tuning = Tuning::default();
    let a = play_game(&tuning, &engine(EvolutionConfig::default()), 7, 200, 0).unwrap();
    let b = play_game(&tuning, &engine(EvolutionConfig::default()), 7, 200, 0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.ticks, 200);
}

#[test]
fn test_every_starting_craft_draws_a_genome() {
    let tuning = Tuning::default();
    let evolution = engine(EvolutionConfig::default());
    let outcome = play_game(&tuning, &evolution, 3, 5, 0).unwrap();

    let starting = tuning.world.teams.len() * tuning.world.craft_per_team;
    let engine = evolution.lock();
    assert!(engine.population().tested >= starting);
    assert!(engine.population().len() >= starting);
    assert_eq!(outcome.teams.len(), tuning.world.teams.len());
}

#[test]
fn test_craft_mine_within_a_few_hundred_ticks() {
    let tuning = Tuning::default();
    let evolution = engine(EvolutionConfig::default());
    let mut game = Game::new(&tuning, &evolution, 21).unwrap();
    game.run(600, 0);
    let outcome = game.finish();
    assert!(outcome.mined > 0.0, "no craft touched a deposit: {outcome:?}");
}

#[test]
fn test_evolution_carries_across_games_and_persists() {
    let tuning = Tuning::default();
    let evolution = engine(EvolutionConfig {
        evolve_threshold: 4,
        ..EvolutionConfig::default()
    });

    for seed in 0..2 {
        play_game(&tuning, &evolution, seed, 50, 0).unwrap();
        assert!(evolve_if_ready(&evolution), "four pilots per game reach the threshold");
    }
    let population = evolution.lock().population().clone();
    assert_eq!(population.generation, 2);
    assert_eq!(population.tested, 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.json");
    save_knowledge(&path, &population).unwrap();
    assert_eq!(load_knowledge(&path).unwrap(), population);
}

//! One game: a generated world, a commander per team and the stepper.

use anyhow::Result;
use pilot_control::{Posture, SharedEvolution, TeamCommander};
use pilot_core::{ObjectKind, TeamId, WorldSnapshot};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::generate::build_world;
use crate::stepper::{apply_purchases, step, Economy, StepReport};
use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOutcome {
    pub team: TeamId,
    pub score: f64,
    pub ships: usize,
    pub depots: usize,
    pub ships_bought: u32,
    pub depots_bought: u32,
    pub posture: Posture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub seed: u64,
    pub ticks: u64,
    pub mined: f64,
    pub stranded: u32,
    pub teams: Vec<TeamOutcome>,
}

impl GameOutcome {
    pub fn total_score(&self) -> f64 {
        self.teams.iter().map(|team| team.score).sum()
    }
}

pub struct Game {
    tuning: Tuning,
    seed: u64,
    world: WorldSnapshot,
    economy: Economy,
    commanders: Vec<TeamCommander>,
    rng: ChaCha8Rng,
    mined: f64,
    stranded: u32,
}

impl Game {
    /// Builds the world for `seed`. Every team's pilots draw genomes from the
    /// same shared engine.
    pub fn new(tuning: &Tuning, evolution: &SharedEvolution, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let world = build_world(&tuning.world, &mut rng)?;
        let economy = Economy::new(&tuning.world.teams);
        let commanders = tuning
            .world
            .teams
            .iter()
            .map(|team| {
                TeamCommander::new(
                    team.clone(),
                    tuning.team.clone(),
                    evolution.clone(),
                    rng.next_u64(),
                )
            })
            .collect();
        Ok(Self {
            tuning: tuning.clone(),
            seed,
            world,
            economy,
            commanders,
            rng,
            mined: 0.0,
            stranded: 0,
        })
    }

    pub fn world(&self) -> &WorldSnapshot {
        &self.world
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn commanders(&self) -> &[TeamCommander] {
        &self.commanders
    }

    /// Resources pulled out of deposits so far this game.
    pub fn mined(&self) -> f64 {
        self.mined
    }

    pub fn stranded(&self) -> u32 {
        self.stranded
    }

    /// Plans, steps physics, then lets each team shop.
    pub fn tick(&mut self) -> StepReport {
        let mut commands = Vec::new();
        for commander in &mut self.commanders {
            let score = self.economy.score(commander.team());
            commands.extend(commander.movement_start(&self.world, score));
        }

        let report = step(
            &mut self.world,
            &commands,
            &self.tuning.physics,
            &self.tuning.world,
            &mut self.economy,
            &mut self.rng,
        );
        self.mined += report.mined;
        self.stranded += report.stranded;

        for commander in &mut self.commanders {
            commander.movement_end(&self.world);
            let team = commander.team().clone();
            let ledger = self.economy.ledger(&team, &self.tuning.physics);
            let purchases = commander.purchases(&self.world, &ledger);
            if purchases.is_empty() {
                continue;
            }
            apply_purchases(
                &mut self.world,
                &team,
                &purchases,
                &self.tuning.physics,
                &self.tuning.world,
                &mut self.economy,
                &mut self.rng,
            );
        }
        report
    }

    /// Runs `ticks` more ticks, logging a progress line every `print_every`
    /// (0 disables it).
    pub fn run(&mut self, ticks: u64, print_every: u64) {
        for _ in 0..ticks {
            self.tick();
            let now = self.world.tick;
            if print_every > 0 && now % print_every == 0 {
                let scores: Vec<String> = self
                    .economy
                    .accounts()
                    .iter()
                    .map(|(team, account)| format!("{team}={:.0}", account.score))
                    .collect();
                tracing::info!(
                    seed = self.seed,
                    tick = now,
                    objects = self.world.objects.len(),
                    scores = %scores.join(" "),
                    "progress"
                );
            }
        }
    }

    /// Closes every evaluation window and reports the final standings.
    pub fn finish(mut self) -> GameOutcome {
        let mut teams = Vec::with_capacity(self.commanders.len());
        for commander in &mut self.commanders {
            let team = commander.team().clone();
            let score = self.economy.score(&team);
            let posture = commander.posture();
            commander.finish_evaluation(score);

            let owned = |kind: ObjectKind| {
                self.world
                    .objects
                    .iter()
                    .filter(|object| object.kind == kind && object.is_owned_by(Some(&team)))
                    .count()
            };
            let account = self.economy.account(&team).cloned().unwrap_or_default();
            teams.push(TeamOutcome {
                ships: owned(ObjectKind::MobileCraft),
                depots: owned(ObjectKind::Depot),
                ships_bought: account.ships_bought,
                depots_bought: account.depots_bought,
                score,
                posture,
                team,
            });
        }
        let outcome = GameOutcome {
            seed: self.seed,
            ticks: self.world.tick,
            mined: self.mined,
            stranded: self.stranded,
            teams,
        };
        for team in &outcome.teams {
            tracing::info!(
                seed = outcome.seed,
                team = %team.team,
                score = team.score,
                ships = team.ships,
                depots = team.depots,
                posture = ?team.posture,
                "game finished"
            );
        }
        outcome
    }
}

/// Plays one full game.
pub fn play_game(
    tuning: &Tuning,
    evolution: &SharedEvolution,
    seed: u64,
    ticks: u64,
    print_every: u64,
) -> Result<GameOutcome> {
    let mut game = Game::new(tuning, evolution, seed)?;
    game.run(ticks, print_every);
    Ok(game.finish())
}

/// Runs an evolve step when enough candidates have been scored. Returns
/// whether one ran.
pub fn evolve_if_ready(evolution: &SharedEvolution) -> bool {
    let mut engine = evolution.lock();
    if !engine.ready_to_evolve() {
        return false;
    }
    engine.evolve();
    true
}

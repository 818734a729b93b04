use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use pilot_control::{EvolutionEngine, PolicyRanges, Population};
use pilot_world::{
    evolve_if_ready, load_or_fresh, load_tuning, play_game, save_knowledge, GameOutcome,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "pilot_cli", about = "Mining pilot harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play games back to back, evolving pilot policies between them.
    Run {
        #[arg(long, default_value_t = 1)]
        games: u32,
        #[arg(long, default_value_t = 2000)]
        ticks: u64,
        /// Seed of the first game; later games count up from it. Random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        /// Evolution state read before the first game and written after the last.
        #[arg(long, default_value = "knowledge.json")]
        knowledge: PathBuf,
        /// Leave the knowledge file untouched.
        #[arg(long)]
        no_save: bool,
        /// Log a progress line every N ticks (0 disables).
        #[arg(long, default_value_t = 500)]
        print_every: u64,
    },
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

struct RunArgs<'a> {
    games: u32,
    ticks: u64,
    seed: Option<u64>,
    content_dir: &'a str,
    knowledge: &'a Path,
    save: bool,
    print_every: u64,
}

fn run(args: &RunArgs<'_>) -> Result<()> {
    let tuning = load_tuning(args.content_dir)?;
    let population = load_or_fresh(args.knowledge);
    let first_seed = args.seed.unwrap_or_else(rand::random);
    let evolution =
        EvolutionEngine::new(tuning.evolution.clone(), population, first_seed).into_shared();

    println!(
        "Starting: games={} ticks={} seed={first_seed} teams={}",
        args.games,
        args.ticks,
        tuning.world.teams.len(),
    );
    println!("{}", "-".repeat(80));

    for game in 0..args.games {
        let seed = first_seed.wrapping_add(u64::from(game));
        tracing::debug!(game, seed, "starting game");
        let outcome = play_game(&tuning, &evolution, seed, args.ticks, args.print_every)?;
        print_outcome(game, &outcome);
        if evolve_if_ready(&evolution) {
            let engine = evolution.lock();
            println!(
                "    evolved to generation {} (population {})",
                engine.population().generation,
                engine.population().len()
            );
        }
    }

    println!("{}", "-".repeat(80));
    let population = evolution.lock().population().clone();
    print_population(&population, &tuning.team.ranges);
    if args.save {
        save_knowledge(args.knowledge, &population)?;
        println!("Knowledge written to {}", args.knowledge.display());
    }
    Ok(())
}

fn print_outcome(game: u32, outcome: &GameOutcome) {
    let standings: Vec<String> = outcome
        .teams
        .iter()
        .map(|team| {
            format!(
                "{}={:.0} (ships={} depots={} {:?})",
                team.team, team.score, team.ships, team.depots, team.posture
            )
        })
        .collect();
    println!(
        "[game={game:03} seed={} tick={}]  mined={:.0}  stranded={}  {}",
        outcome.seed,
        outcome.ticks,
        outcome.mined,
        outcome.stranded,
        standings.join("  "),
    );
}

fn print_population(population: &Population, ranges: &PolicyRanges) {
    let mean = population
        .mean_fitness()
        .map_or_else(|| "n/a".to_string(), |mean| format!("{mean:.1}"));
    println!(
        "Generation {}: {} genomes, {} tested, mean fitness {mean}",
        population.generation,
        population.len(),
        population.tested,
    );
    if let Some(best) = population.best.as_ref() {
        let policy = ranges.decode(best);
        println!(
            "Best so far: fitness={:.1} fuel_return={:.0} cargo_capacity={:.0} \
             max_speed={:.1} frontier={:.0}",
            best.fitness,
            policy.fuel_return,
            policy.cargo_capacity,
            policy.max_speed,
            policy.frontier,
        );
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            games,
            ticks,
            seed,
            content_dir,
            knowledge,
            no_save,
            print_every,
        } => run(&RunArgs {
            games,
            ticks,
            seed,
            content_dir: &content_dir,
            knowledge: &knowledge,
            save: !no_save,
            print_every,
        })?,
    }
    Ok(())
}

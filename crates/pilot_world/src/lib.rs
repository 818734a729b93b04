//! Harness collaborators for the pilot crates: tuning and knowledge files,
//! seeded world generation and a kinematic stepper. Shared by pilot_cli and
//! pilot_bench.

mod game;
mod generate;
mod knowledge;
mod stepper;
mod tuning;

pub use game::{evolve_if_ready, play_game, Game, GameOutcome, TeamOutcome};
pub use generate::{build_world, WorldGenConfig};
pub use knowledge::{
    load_knowledge, load_or_fresh, save_knowledge, Knowledge, KNOWLEDGE_SCHEMA_VERSION,
};
pub use stepper::{
    apply_purchases, step, Economy, PhysicsConfig, StepReport, TeamAccount, TeamLedger,
};
pub use tuning::{load_tuning, validate_tuning, Tuning, TUNING_FILE};

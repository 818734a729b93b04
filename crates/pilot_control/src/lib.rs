//! `pilot_control`: team and pilot controllers built on `pilot_core`.
//!
//! Owns everything that persists across ticks: per-craft pilots, the team
//! posture, depot siting and the shared evolution engine that tunes policy
//! constants between evaluation windows.

mod commander;
mod evolution;
mod frontier;
mod genome;
mod pilot;
mod strategy;

pub use commander::{
    CommanderConfig, CraftCommand, Purchase, PurchaseKind, PurchaseLedger, TeamCommander,
    TeamConfig,
};
pub use evolution::{
    crossover, mutate, CandidateTicket, EvolutionConfig, EvolutionEngine, Population,
    SharedEvolution,
};
pub use frontier::densest_cluster;
pub use genome::{Gene, GeneRange, Genome, PolicyRanges, GENE_COUNT};
pub use pilot::{Directive, Pilot, Role};
pub use strategy::{choose_strategy, Posture, StrategyConfig, StrategyState};

//! Genomes and their decoding into pilot policy constants.

use pilot_core::PolicyParams;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const GENE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gene {
    FuelReturn,
    CargoCapacity,
    MaxSpeed,
    Frontier,
}

impl Gene {
    pub const ALL: [Gene; GENE_COUNT] = [
        Gene::FuelReturn,
        Gene::CargoCapacity,
        Gene::MaxSpeed,
        Gene::Frontier,
    ];

    pub fn index(self) -> usize {
        match self {
            Gene::FuelReturn => 0,
            Gene::CargoCapacity => 1,
            Gene::MaxSpeed => 2,
            Gene::Frontier => 3,
        }
    }
}

/// Fixed-size gene vector in `[0, 1]` plus the fitness last observed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub genes: [f64; GENE_COUNT],
    #[serde(default)]
    pub fitness: f64,
}

impl Genome {
    pub fn new(genes: [f64; GENE_COUNT]) -> Self {
        Self {
            genes: genes.map(|gene| gene.clamp(0.0, 1.0)),
            fitness: 0.0,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(std::array::from_fn(|_| rng.gen_range(0.0..=1.0)))
    }

    pub fn gene(&self, gene: Gene) -> f64 {
        self.genes[gene.index()]
    }

    /// Copy with fitness cleared, ready for another evaluation.
    pub fn untested(&self) -> Self {
        Self {
            genes: self.genes,
            fitness: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneRange {
    pub min: f64,
    pub max: f64,
}

impl GeneRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn lerp(&self, gene: f64) -> f64 {
        self.min + (self.max - self.min) * gene.clamp(0.0, 1.0)
    }
}

/// Per-gene `[min, max]` ranges a genome is mapped onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyRanges {
    pub fuel_return: GeneRange,
    pub cargo_capacity: GeneRange,
    pub max_speed: GeneRange,
    pub frontier: GeneRange,
}

impl Default for PolicyRanges {
    fn default() -> Self {
        Self {
            fuel_return: GeneRange::new(500.0, 3000.0),
            cargo_capacity: GeneRange::new(250.0, 2500.0),
            max_speed: GeneRange::new(40.0, 160.0),
            frontier: GeneRange::new(100.0, 400.0),
        }
    }
}

impl PolicyRanges {
    pub fn decode(&self, genome: &Genome) -> PolicyParams {
        PolicyParams {
            fuel_return: self.fuel_return.lerp(genome.gene(Gene::FuelReturn)),
            cargo_capacity: self.cargo_capacity.lerp(genome.gene(Gene::CargoCapacity)),
            max_speed: self.max_speed.lerp(genome.gene(Gene::MaxSpeed)),
            frontier: self.frontier.lerp(genome.gene(Gene::Frontier)),
        }
    }

    pub fn range(&self, gene: Gene) -> GeneRange {
        match gene {
            Gene::FuelReturn => self.fuel_return,
            Gene::CargoCapacity => self.cargo_capacity,
            Gene::MaxSpeed => self.max_speed,
            Gene::Frontier => self.frontier,
        }
    }
}

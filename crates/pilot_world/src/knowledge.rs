//! Evolution state persistence.
//!
//! The population is read once before the first game and written once after
//! the last. A missing or unreadable file never stops a run: the caller gets a
//! fresh population and a warning.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pilot_control::Population;
use serde::{Deserialize, Serialize};

pub const KNOWLEDGE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub schema_version: u32,
    /// RFC 3339 timestamp of the save.
    #[serde(default)]
    pub saved_at: Option<String>,
    pub population: Population,
}

pub fn load_knowledge(path: &Path) -> Result<Population> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading knowledge file: {}", path.display()))?;
    let knowledge: Knowledge = serde_json::from_str(&json)
        .with_context(|| format!("parsing knowledge file: {}", path.display()))?;
    if knowledge.schema_version != KNOWLEDGE_SCHEMA_VERSION {
        bail!(
            "knowledge schema version {} is not supported (expected {KNOWLEDGE_SCHEMA_VERSION})",
            knowledge.schema_version
        );
    }
    let population = knowledge.population;
    for (index, genome) in population.genomes.iter().enumerate() {
        if genome
            .genes
            .iter()
            .any(|gene| !gene.is_finite() || !(0.0..=1.0).contains(gene))
        {
            bail!("genome {index} has a gene outside [0, 1]");
        }
    }
    if population.next_candidate > population.genomes.len() {
        bail!(
            "candidate cursor {} is past the {} stored genomes",
            population.next_candidate,
            population.genomes.len()
        );
    }
    Ok(population)
}

/// Loads the stored population, or starts over at generation 0.
pub fn load_or_fresh(path: &Path) -> Population {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no knowledge file, starting fresh");
        return Population::default();
    }
    match load_knowledge(path) {
        Ok(population) => {
            tracing::info!(
                path = %path.display(),
                generation = population.generation,
                genomes = population.len(),
                "loaded knowledge"
            );
            population
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{err:#}"),
                "knowledge unusable, starting fresh"
            );
            Population::default()
        }
    }
}

/// Writes `population` via a temp file and rename so a crash mid-write never
/// leaves a truncated file behind.
pub fn save_knowledge(path: &Path, population: &Population) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory: {}", parent.display()))?;
    }
    let knowledge = Knowledge {
        schema_version: KNOWLEDGE_SCHEMA_VERSION,
        saved_at: Some(chrono::Utc::now().to_rfc3339()),
        population: population.clone(),
    };
    let json = serde_json::to_string_pretty(&knowledge).context("serializing knowledge")?;
    let tmp_path = path.with_extension("json.tmp");
    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} into place", tmp_path.display()))?;
    tracing::info!(
        path = %path.display(),
        generation = population.generation,
        "saved knowledge"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_control::Genome;

    fn sample_population() -> Population {
        let mut fitted = Genome::new([0.1, 0.123_456_789, 0.5, 1.0]);
        fitted.fitness = 1234.567_890_123;
        Population {
            genomes: vec![fitted.clone(), Genome::new([0.0, 0.25, 0.75, 0.333])],
            next_candidate: 1,
            tested: 1,
            generation: 7,
            best: Some(fitted),
        }
    }

    #[test]
    fn save_then_load_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        let population = sample_population();

        save_knowledge(&path, &population).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_knowledge(&path).unwrap(), population);
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/knowledge.json");
        save_knowledge(&path, &Population::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let population = load_or_fresh(&dir.path().join("absent.json"));
        assert_eq!(population, Population::default());
    }

    #[test]
    fn garbage_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_knowledge(&path).is_err());
        assert_eq!(load_or_fresh(&path), Population::default());
    }

    #[test]
    fn wrong_schema_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        let knowledge = Knowledge {
            schema_version: KNOWLEDGE_SCHEMA_VERSION + 1,
            saved_at: None,
            population: sample_population(),
        };
        std::fs::write(&path, serde_json::to_string(&knowledge).unwrap()).unwrap();
        let err = load_knowledge(&path).unwrap_err();
        assert!(err.to_string().contains("schema version"));
    }

    #[test]
    fn out_of_range_gene_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.json");
        let mut population = sample_population();
        population.genomes[1].genes[2] = 1.5;
        let knowledge = Knowledge {
            schema_version: KNOWLEDGE_SCHEMA_VERSION,
            saved_at: None,
            population,
        };
        std::fs::write(&path, serde_json::to_string(&knowledge).unwrap()).unwrap();
        assert!(load_knowledge(&path).is_err());
    }
}

use crate::run_result::SeedMetrics;
use serde::Serialize;

type Extractor = (&'static str, Box<dyn Fn(&SeedMetrics) -> f64>);

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub seed_count: usize,
    /// Seeds whose teams never delivered anything.
    pub scoreless_count: usize,
    pub metrics: Vec<MetricSummary>,
}

#[derive(Debug, Serialize)]
pub struct MetricSummary {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}

fn extractors() -> Vec<Extractor> {
    vec![
        ("total_score", Box::new(|m| m.total_score)),
        ("mean_game_score", Box::new(|m| m.mean_game_score)),
        ("best_team_score", Box::new(|m| m.best_team_score)),
        ("mined", Box::new(|m| m.mined)),
        ("stranded", Box::new(|m| f64::from(m.stranded))),
        ("ships_bought", Box::new(|m| f64::from(m.ships_bought))),
        ("depots_bought", Box::new(|m| f64::from(m.depots_bought))),
        ("final_ships", Box::new(|m| m.final_ships as f64)),
        ("final_depots", Box::new(|m| m.final_depots as f64)),
        ("generation", Box::new(|m| f64::from(m.generation))),
        (
            "best_fitness",
            Box::new(|m| m.best_fitness.unwrap_or(0.0)),
        ),
    ]
}

pub fn compute_summary(results: &[(u64, &SeedMetrics)]) -> SummaryStats {
    let scoreless_count = results
        .iter()
        .filter(|(_, metrics)| metrics.total_score <= 0.0)
        .count();

    let metrics = extractors()
        .iter()
        .map(|(name, extract)| {
            let values: Vec<f64> = results.iter().map(|(_, m)| extract(m)).collect();
            compute_metric_summary(name, &values)
        })
        .collect();

    SummaryStats {
        seed_count: results.len(),
        scoreless_count,
        metrics,
    }
}

fn compute_metric_summary(name: &str, values: &[f64]) -> MetricSummary {
    if values.is_empty() {
        return MetricSummary {
            name: name.to_string(),
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            stddev: 0.0,
        };
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

    MetricSummary {
        name: name.to_string(),
        mean,
        min,
        max,
        stddev: variance.sqrt(),
    }
}

/// `{ "metric": { "mean": .., "min": .., "max": .., "stddev": .. }, .. }`
pub fn build_aggregated_metrics(stats: &SummaryStats) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for summary in &stats.metrics {
        map.insert(
            summary.name.clone(),
            serde_json::json!({
                "mean": summary.mean,
                "min": summary.min,
                "max": summary.max,
                "stddev": summary.stddev,
            }),
        );
    }
    serde_json::Value::Object(map)
}

pub fn print_summary(scenario_name: &str, ticks: u64, games: u32, stats: &SummaryStats) {
    let tick_display = if ticks >= 1000 {
        format!("{}k", ticks / 1000)
    } else {
        ticks.to_string()
    };
    println!(
        "\n=== {} ({} seeds, {} games × {} ticks each) ===\n",
        scenario_name, stats.seed_count, games, tick_display
    );
    println!(
        "{:<30} {:>10} {:>10} {:>10} {:>10}",
        "Metric", "Mean", "Min", "Max", "StdDev"
    );
    println!("{}", "-".repeat(74));
    for metric in &stats.metrics {
        println!(
            "{:<30} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            metric.name, metric.mean, metric.min, metric.max, metric.stddev
        );
    }
    println!(
        "{:<30} {}/{}",
        "scoreless_rate", stats.scoreless_count, stats.seed_count
    );
}

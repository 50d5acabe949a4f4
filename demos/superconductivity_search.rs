//! End-to-end grid search on a synthetic superconductivity-style dataset.
//!
//! Writes `train.csv` (material properties), `formula_train.csv` (element counts) and
//! their merge into a scratch directory, runs two searches against the same result
//! store to show duplicate skipping, then prints the reports.
//!
//! Run with: `cargo run --example superconductivity_search`

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pipegrid::combination::{extract_combinations, Pipe, Step};
use pipegrid::data::{train_test_split, Dataset};
use pipegrid::logging::init_tracing;
use pipegrid::model::{DecisionTreeRegressor, LinearRegression, Stage, StandardScaler};
use pipegrid::report::{best_hyperparameters, render_report, top_results};
use pipegrid::steps::{
    HighCorrFeaturesRemover, OnlyFormula, OnlyProperties, FORMULA_FILE, MATERIAL_COLUMN,
    PROPERTIES_FILE, TARGET_COLUMN,
};
use pipegrid::store::{CsvResultStore, ResultStore};
use pipegrid::{grid_search, SearchConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const N_SAMPLES: usize = 240;
const MERGED_FILE: &str = "merged.csv";

fn write_datasets(dir: &Path) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut train = format!("mean_mass,mean_radius,mean_valence,{TARGET_COLUMN}\n");
    let mut formula = format!("H,O,Cu,{TARGET_COLUMN},{MATERIAL_COLUMN}\n");
    let mut merged = format!("mean_mass,mean_radius,mean_valence,H,O,Cu,{TARGET_COLUMN}\n");

    for i in 0..N_SAMPLES {
        let mass: f64 = rng.gen_range(10.0..200.0);
        let radius = mass.mul_add(0.01, rng.gen_range(-0.05..0.05));
        let valence: f64 = rng.gen_range(1.0..6.0);
        let (h, o, cu): (f64, f64, f64) =
            (rng.gen_range(0.0..4.0), rng.gen_range(0.0..7.0), rng.gen_range(0.0..3.0));
        let temp = 0.3f64.mul_add(mass, 8.0 * cu) - 2.0 * valence + rng.gen_range(-1.0..1.0);
        writeln!(train, "{mass},{radius},{valence},{temp}")?;
        writeln!(formula, "{h},{o},{cu},{temp},H{h:.0}O{o:.0}Cu{cu:.0}-{i}")?;
        writeln!(merged, "{mass},{radius},{valence},{h},{o},{cu},{temp}")?;
    }

    fs::write(dir.join(PROPERTIES_FILE), train)?;
    fs::write(dir.join(FORMULA_FILE), formula)?;
    fs::write(dir.join(MERGED_FILE), merged)?;
    Ok(())
}

fn pipes(config: &SearchConfig) -> Result<Vec<Pipe>> {
    Ok(vec![
        Pipe::new(vec![
            Step::new("corr", Stage::transformer(HighCorrFeaturesRemover::new()))
                .param("corr_threshold", vec![0.9, 0.99]),
            Step::new("scale", Stage::transformer(StandardScaler::new())),
            Step::new("lr", Stage::regressor(LinearRegression::new()))
                .param("alpha", vec![0.0, 1.0]),
        ])?,
        Pipe::new(vec![
            Step::new("properties", Stage::transformer(OnlyProperties::from_config(config))),
            Step::new("scale", Stage::transformer(StandardScaler::new())),
            Step::new("tree", Stage::regressor(DecisionTreeRegressor::new()))
                .param("max_depth", vec![Some(4), None])
                .param("min_samples_leaf", vec![1, 5]),
        ])?,
        Pipe::new(vec![
            Step::new("formula", Stage::transformer(OnlyFormula::from_config(config))),
            Step::new("lr", Stage::regressor(LinearRegression::new())),
        ])?,
    ])
}

fn main() -> Result<()> {
    init_tracing("info");

    let scratch = std::env::temp_dir().join("pipegrid-demo");
    let data_dir = scratch.join("data");
    fs::create_dir_all(&data_dir).context("creating scratch data directory")?;
    write_datasets(&data_dir)?;

    let config = SearchConfig::builder()
        .output_dir(scratch.join("output"))
        .data_dir(&data_dir)
        .build()?;

    let dataset = Dataset::from_csv(data_dir.join(MERGED_FILE), TARGET_COLUMN, &[] as &[&str])?;
    let split = train_test_split(&dataset, 0.2, 42)?;

    for run in 1..=2 {
        let mut combinations = extract_combinations(&pipes(&config)?)?;
        let summary = grid_search(&config, &split, &mut combinations, "demo")?;
        println!(
            "run {run}: evaluated {}, skipped {}",
            summary.evaluated, summary.skipped
        );
    }

    let table = CsvResultStore::new(config.result_path("demo")).load()?;
    println!("\n{}", render_report(&top_results(&table, 5)?, "R2 sorted")?);

    println!("Hyperparameters of the best 25% runs:");
    for column in best_hyperparameters(&table, 25)? {
        let values: Vec<String> = column
            .values
            .iter()
            .map(|v| v.clone().unwrap_or_else(|| "<null>".to_string()))
            .collect();
        println!("  {}: {}", column.column, values.join(", "));
    }
    Ok(())
}

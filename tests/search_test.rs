//! End-to-end search tests against a CSV result store

use arrow::array::{Array, StringArray};
use ndarray::{Array1, Array2};
use pipegrid::combination::{extract_combinations, Pipe, Step};
use pipegrid::data::{train_test_split, Dataset, SplitData};
use pipegrid::model::{DecisionTreeRegressor, LinearRegression, Stage, StandardScaler};
use pipegrid::report::{best_hyperparameters, top_results};
use pipegrid::steps::HighCorrFeaturesRemover;
use pipegrid::store::{CsvResultStore, ResultStore};
use pipegrid::{grid_search, Frame, SearchConfig};

/// y = 2*x0 - x1 + 0.5, with x2 a near-copy of x0.
#[allow(clippy::cast_precision_loss)]
fn split() -> SplitData {
    let n = 60;
    let x = Array2::from_shape_fn((n, 3), |(i, j)| {
        let t = i as f64;
        match j {
            0 => t,
            1 => (t * 0.7).sin() * 10.0,
            _ => t + 0.001 * (t * 1.3).cos(),
        }
    });
    let y: Array1<f64> = x
        .rows()
        .into_iter()
        .map(|r| 2.0 * r[0] - r[1] + 0.5)
        .collect();
    let columns = vec!["x0".to_string(), "x1".to_string(), "x2".to_string()];
    let dataset = Dataset::new(Frame::new(columns, x).unwrap(), y).unwrap();
    train_test_split(&dataset, 0.25, 7).unwrap()
}

fn pipes() -> Vec<Pipe> {
    vec![
        Pipe::new(vec![
            Step::new("corr", Stage::transformer(HighCorrFeaturesRemover::new()))
                .param("corr_threshold", 0.95),
            Step::new("lr", Stage::regressor(LinearRegression::new()))
                .param("fit_intercept", vec![true, false]),
        ])
        .unwrap(),
        Pipe::new(vec![
            Step::new("scale", Stage::transformer(StandardScaler::new())),
            Step::new("tree", Stage::regressor(DecisionTreeRegressor::new()))
                .param("max_depth", vec![Some(3), None]),
        ])
        .unwrap(),
    ]
}

#[test]
fn test_search_persists_and_reruns_skip() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .output_dir(dir.path().join("output"))
        .build()
        .unwrap();
    let data = split();

    let mut combos = extract_combinations(&pipes()).unwrap();
    let summary = grid_search(&config, &data, &mut combos, "mixed").unwrap();
    assert_eq!(summary.evaluated, 4);
    assert_eq!(summary.skipped, 0);
    assert!(summary.best_estimator.is_none());

    let store = CsvResultStore::new(config.result_path("mixed"));
    assert!(store.path().ends_with("output/mixed_output.csv"));
    let table = store.load().unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(
        table.columns(),
        &[
            "tag",
            "MSE",
            "R2",
            "corr__corr_threshold",
            "lr__fit_intercept",
            "tree__max_depth"
        ]
    );
    let depths: Vec<Option<&str>> = (2..4).map(|row| table.cell(row, "tree__max_depth")).collect();
    assert_eq!(depths, vec![Some("3"), Some("'None'")]);

    // the exact linear model wins
    let best = top_results(&table, 1).unwrap();
    let tags = best
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(tags.value(0), "corr + lr");

    let mut again = extract_combinations(&pipes()).unwrap();
    let summary = grid_search(&config, &data, &mut again, "mixed").unwrap();
    assert_eq!(summary.evaluated, 0);
    assert_eq!(summary.skipped, 4);
    assert_eq!(store.load().unwrap().len(), 4);
}

#[test]
fn test_new_parameter_value_is_evaluated_on_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder()
        .output_dir(dir.path())
        .cv_folds(2)
        .build()
        .unwrap();
    let data = split();

    let tree = |depths: Vec<i64>| {
        Pipe::new(vec![Step::new("tree", Stage::regressor(DecisionTreeRegressor::new()))
            .param("max_depth", depths)])
        .unwrap()
    };
    let mut first = extract_combinations(&[tree(vec![3])]).unwrap();
    grid_search(&config, &data, &mut first, "tree").unwrap();

    let mut second = extract_combinations(&[tree(vec![3, 6])]).unwrap();
    let summary = grid_search(&config, &data, &mut second, "tree").unwrap();
    assert_eq!((summary.evaluated, summary.skipped), (1, 1));
    assert!(second[1].scores().is_ok());
    assert!(second[0].scores().is_err());

    let table = CsvResultStore::new(config.result_path("tree")).load().unwrap();
    let narrowed = best_hyperparameters(&table, 100).unwrap();
    let depth = narrowed.iter().find(|c| c.column == "tree__max_depth").unwrap();
    assert_eq!(depth.values.len(), 2);
}

#[test]
fn test_fit_failure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = SearchConfig::builder().output_dir(dir.path()).build().unwrap();
    let pipe = Pipe::new(vec![
        Step::new("corr", Stage::transformer(HighCorrFeaturesRemover::new())),
        Step::new("lr", Stage::regressor(LinearRegression::new())),
    ])
    .unwrap();
    let mut combos = extract_combinations(&[pipe]).unwrap();
    assert!(grid_search(&config, &split(), &mut combos, "broken").is_err());
    assert!(!CsvResultStore::new(config.result_path("broken")).exists());
}

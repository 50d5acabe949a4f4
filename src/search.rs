//! Grid-search driver
//!
//! Evaluates combinations one at a time:
//!
//! 1. skip the combination if the result store already holds it (when saving),
//! 2. cross-validate a private copy of its pipeline and refit it on the training split,
//! 3. score the refit pipeline on the test split,
//! 4. append the row to the result store (when saving).

use tracing::info;

use crate::combination::Combination;
use crate::config::SearchConfig;
use crate::data::SplitData;
use crate::model::{mean_squared_error, r2_score, GridSearchCv, Pipeline};
use crate::store::{CsvResultStore, ResultStore};
use crate::Result;

/// Outcome of a search run.
#[derive(Debug, Clone)]
pub struct SearchSummary {
    /// Combinations fitted and scored
    pub evaluated: usize,
    /// Combinations skipped as already tested
    pub skipped: usize,
    /// Refit pipeline of the last evaluated combination, kept only when results
    /// are not saved
    pub best_estimator: Option<Pipeline>,
}

/// Run the search against the CSV store `<output_dir>/<estimator_tag>_output.csv`.
///
/// Scores are written back into `combinations`.
///
/// # Errors
///
/// Propagates the first fit, predict or store-append failure; the run stops there.
pub fn grid_search(
    config: &SearchConfig,
    data: &SplitData,
    combinations: &mut [Combination],
    estimator_tag: &str,
) -> Result<SearchSummary> {
    let store = CsvResultStore::new(config.result_path(estimator_tag));
    grid_search_with_store(config, data, combinations, &store)
}

/// Run the search against any result store.
///
/// # Errors
///
/// Propagates the first fit, predict or store-append failure; the run stops there.
pub fn grid_search_with_store<S: ResultStore + ?Sized>(
    config: &SearchConfig,
    data: &SplitData,
    combinations: &mut [Combination],
    store: &S,
) -> Result<SearchSummary> {
    let total = combinations.len();
    let mut summary = SearchSummary {
        evaluated: 0,
        skipped: 0,
        best_estimator: None,
    };

    for (i, combination) in combinations.iter_mut().enumerate() {
        info!("Combination {}/{total} | {}", i + 1, combination.tag());

        if config.save_results() && store.already_tested(combination) {
            info!(skipped = true, tag = combination.tag(), "Combination already tested");
            summary.skipped += 1;
            continue;
        }

        let fitted = evaluate_combination(config, data, combination)?;
        summary.evaluated += 1;

        if config.save_results() {
            store.append(&combination.as_record()?)?;
        } else {
            summary.best_estimator = Some(fitted);
        }
    }

    info!(
        evaluated = summary.evaluated,
        skipped = summary.skipped,
        "Grid search finished"
    );
    Ok(summary)
}

/// Cross-validate, refit and score one combination, recording MSE and R² on it.
///
/// Returns the refit pipeline. The shared pipeline prototype is never modified.
///
/// # Errors
///
/// Propagates fit and predict failures.
pub fn evaluate_combination(
    config: &SearchConfig,
    data: &SplitData,
    combination: &mut Combination,
) -> Result<Pipeline> {
    let mut search = GridSearchCv::single(combination.pipeline(), combination.parameters())
        .with_cv(config.cv_folds())
        .with_n_jobs(config.n_jobs());
    search.fit(&data.x_train, &data.y_train)?;

    let y_pred = search.predict(&data.x_test)?;
    let mse = mean_squared_error(&data.y_test, &y_pred)?;
    let r2 = r2_score(&data.y_test, &y_pred)?;
    info!(tag = combination.tag(), r2, mse, "Combination scored");
    combination.set_mse(mse).set_r2(r2);

    search.into_best_estimator().ok_or_else(|| {
        crate::Error::InvalidState("grid search finished without a refit estimator".to_string())
    })
}

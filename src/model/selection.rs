//! Exhaustive cross-validated grid search

use aprender::model_selection::KFold;
use ndarray::Array1;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use super::{r2_score, Pipeline};
use crate::frame::Frame;
use crate::params::{expand_grid, Candidates, ParamKey, ParamSet};
use crate::{Error, Result};

/// `(train_indices, test_indices)` for one fold.
type Fold = (Vec<usize>, Vec<usize>);

/// Unshuffled k-fold splits; the first `n_samples % n_splits` folds hold one extra sample.
fn split_folds(n_splits: usize, n_samples: usize) -> Result<Vec<Fold>> {
    if n_splits < 2 {
        return Err(Error::InvalidInput("n_splits must be at least 2".to_string()));
    }
    if n_samples < n_splits {
        return Err(Error::InvalidInput(format!(
            "n_samples ({n_samples}) must be >= n_splits ({n_splits})"
        )));
    }
    Ok(KFold::new(n_splits).split(n_samples))
}

/// Cross-validation outcome for one candidate parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct CvResult {
    /// Candidate parameters
    pub params: ParamSet,
    /// R² on each validation fold
    pub fold_scores: Vec<f64>,
    /// Mean of `fold_scores`
    pub mean_score: f64,
}

/// Exhaustive search over a parameter grid scored by k-fold R².
///
/// The best candidate (highest mean R², first one on ties) is refit on the full
/// training data and used by [`GridSearchCv::predict`].
#[derive(Debug, Clone)]
pub struct GridSearchCv {
    estimator: Pipeline,
    param_grid: Vec<(ParamKey, Candidates)>,
    cv_folds: usize,
    n_jobs: Option<usize>,
    cv_results: Vec<CvResult>,
    best_index: Option<usize>,
    best_estimator: Option<Pipeline>,
}

impl GridSearchCv {
    /// Search `param_grid` over copies of `estimator` with 3-fold cross-validation.
    #[must_use]
    pub fn new(estimator: &Pipeline, param_grid: Vec<(ParamKey, Candidates)>) -> Self {
        Self {
            estimator: estimator.clone(),
            param_grid,
            cv_folds: 3,
            n_jobs: None,
            cv_results: Vec::new(),
            best_index: None,
            best_estimator: None,
        }
    }

    /// Build a grid where every key has exactly the single value from `params`.
    #[must_use]
    pub fn single(estimator: &Pipeline, params: &ParamSet) -> Self {
        let grid = params
            .iter()
            .map(|(k, v)| (k.clone(), Candidates::from(v.clone())))
            .collect();
        Self::new(estimator, grid)
    }

    /// Set the number of folds.
    #[must_use]
    pub const fn with_cv(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Worker limit: `Some(1)` scores folds sequentially, `Some(k)` uses a pool of
    /// `k` threads, `None` uses the global rayon pool. Without the `parallel`
    /// feature scoring is always sequential.
    #[must_use]
    pub const fn with_n_jobs(mut self, n_jobs: Option<usize>) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Score every candidate, then refit the best one on all of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty grid or bad fold count, and
    /// propagates any fit/predict failure.
    pub fn fit(&mut self, x: &Frame, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} target values", x.nrows()),
                actual: format!("{} target values", y.len()),
            });
        }
        let candidates = expand_grid(&self.param_grid);
        if candidates.is_empty() {
            return Err(Error::InvalidInput(
                "parameter grid has a key with no candidate values".to_string(),
            ));
        }
        let folds = split_folds(self.cv_folds, x.nrows())?;

        #[cfg(feature = "parallel")]
        let results = match self.worker_pool()? {
            Some(pool) => pool.install(|| self.score_candidates(candidates, &folds, x, y)),
            None => self.score_candidates(candidates, &folds, x, y),
        }?;
        #[cfg(not(feature = "parallel"))]
        let results = self.score_candidates(candidates, &folds, x, y)?;

        let best_index = results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.mean_score.is_nan())
            .fold(None::<(usize, f64)>, |best, (i, r)| match best {
                Some((_, score)) if score >= r.mean_score => best,
                _ => Some((i, r.mean_score)),
            })
            .map_or(0, |(i, _)| i);

        let mut refit = self.estimator.clone();
        refit.set_params(&results[best_index].params)?;
        refit.fit(x, y)?;

        self.cv_results = results;
        self.best_index = Some(best_index);
        self.best_estimator = Some(refit);
        Ok(())
    }

    /// A dedicated pool when the worker limit is above one.
    #[cfg(feature = "parallel")]
    fn worker_pool(&self) -> Result<Option<rayon::ThreadPool>> {
        match self.n_jobs {
            Some(threads) if threads > 1 => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map(Some)
                .map_err(|e| Error::Computation(format!("cannot start {threads} workers: {e}"))),
            _ => Ok(None),
        }
    }

    fn score_candidates(
        &self,
        candidates: Vec<ParamSet>,
        folds: &[Fold],
        x: &Frame,
        y: &Array1<f64>,
    ) -> Result<Vec<CvResult>> {
        let mut results = Vec::with_capacity(candidates.len());
        for params in candidates {
            let fold_scores = self.score_folds(&params, folds, x, y)?;
            #[allow(clippy::cast_precision_loss)]
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!(mean_score, folds = fold_scores.len(), "scored candidate");
            results.push(CvResult {
                params,
                fold_scores,
                mean_score,
            });
        }
        Ok(results)
    }

    #[cfg(feature = "parallel")]
    fn score_folds(
        &self,
        params: &ParamSet,
        folds: &[Fold],
        x: &Frame,
        y: &Array1<f64>,
    ) -> Result<Vec<f64>> {
        if self.n_jobs == Some(1) {
            return folds.iter().map(|f| self.score_fold(params, f, x, y)).collect();
        }
        folds
            .par_iter()
            .map(|f| self.score_fold(params, f, x, y))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn score_folds(
        &self,
        params: &ParamSet,
        folds: &[Fold],
        x: &Frame,
        y: &Array1<f64>,
    ) -> Result<Vec<f64>> {
        folds.iter().map(|f| self.score_fold(params, f, x, y)).collect()
    }

    fn score_fold(
        &self,
        params: &ParamSet,
        (train, test): &Fold,
        x: &Frame,
        y: &Array1<f64>,
    ) -> Result<f64> {
        let mut model = self.estimator.clone();
        model.set_params(params)?;
        let y_train: Array1<f64> = train.iter().map(|&i| y[i]).collect();
        let y_test: Array1<f64> = test.iter().map(|&i| y[i]).collect();
        model.fit(&x.select_rows(train), &y_train)?;
        let y_pred = model.predict(&x.select_rows(test))?;
        r2_score(&y_test, &y_pred)
    }

    /// Predict with the refit best estimator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before [`GridSearchCv::fit`].
    pub fn predict(&self, x: &Frame) -> Result<Array1<f64>> {
        self.best_estimator
            .as_ref()
            .ok_or_else(|| Error::NotFitted("GridSearchCv::predict".to_string()))?
            .predict(x)
    }

    /// Per-candidate cross-validation results in grid order.
    #[must_use]
    pub fn cv_results(&self) -> &[CvResult] {
        &self.cv_results
    }

    /// Best candidate parameters.
    #[must_use]
    pub fn best_params(&self) -> Option<&ParamSet> {
        self.best_index.map(|i| &self.cv_results[i].params)
    }

    /// Best mean cross-validated R².
    #[must_use]
    pub fn best_score(&self) -> Option<f64> {
        self.best_index.map(|i| self.cv_results[i].mean_score)
    }

    /// The refit best pipeline.
    #[must_use]
    pub const fn best_estimator(&self) -> Option<&Pipeline> {
        self.best_estimator.as_ref()
    }

    /// Take ownership of the refit best pipeline.
    #[must_use]
    pub fn into_best_estimator(self) -> Option<Pipeline> {
        self.best_estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecisionTreeRegressor, LinearRegression, Stage};
    use crate::params::ParamValue;
    use ndarray::Array2;

    fn line_data(n: usize) -> (Frame, Array1<f64>) {
        #[allow(clippy::cast_precision_loss)]
        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let x = Array2::from_shape_vec((n, 1), xs.clone()).unwrap();
        let y = xs.iter().map(|v| 3.0 * v - 1.0).collect();
        (Frame::from_array(x), y)
    }

    fn linear_pipe() -> Pipeline {
        Pipeline::new(vec![("lr".to_string(), Stage::regressor(LinearRegression::new()))]).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let folds = split_folds(3, 10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|(_, test)| test.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[1].1, vec![4, 5, 6]);
        assert_eq!(folds[1].0.len(), 7);
    }

    #[test]
    fn test_split_rejects_too_few_samples() {
        assert!(split_folds(3, 2).is_err());
        assert!(split_folds(1, 10).is_err());
    }

    #[test]
    fn test_grid_search_picks_best_and_refits() {
        let (x, y) = line_data(30);
        let pipe = Pipeline::new(vec![(
            "tree".to_string(),
            Stage::regressor(DecisionTreeRegressor::new()),
        )])
        .unwrap();
        let grid = vec![(
            ParamKey::new("tree", "max_depth"),
            Candidates::from(vec![1, 8]),
        )];
        let mut gs = GridSearchCv::new(&pipe, grid).with_n_jobs(Some(1));
        gs.fit(&x, &y).unwrap();

        assert_eq!(gs.cv_results().len(), 2);
        assert_eq!(
            gs.best_params().unwrap().get(&ParamKey::new("tree", "max_depth")),
            Some(&ParamValue::Int(8))
        );
        assert!(gs.best_estimator().unwrap().is_fitted());
        assert_eq!(gs.predict(&x).unwrap().len(), 30);
    }

    #[test]
    fn test_single_value_grid() {
        let (x, y) = line_data(12);
        let params: ParamSet = [(ParamKey::new("lr", "alpha"), ParamValue::Float(0.0))]
            .into_iter()
            .collect();
        let mut gs = GridSearchCv::single(&linear_pipe(), &params);
        gs.fit(&x, &y).unwrap();
        assert_eq!(gs.cv_results().len(), 1);
        assert!(gs.best_score().unwrap() > 0.99);
    }

    #[test]
    fn test_worker_limit_gives_same_scores() {
        let (x, y) = line_data(20);
        let grid = vec![(
            ParamKey::new("lr", "alpha"),
            Candidates::from(vec![0.0, 1.0]),
        )];
        let mut sequential = GridSearchCv::new(&linear_pipe(), grid.clone()).with_n_jobs(Some(1));
        let mut limited = GridSearchCv::new(&linear_pipe(), grid).with_n_jobs(Some(2));
        sequential.fit(&x, &y).unwrap();
        limited.fit(&x, &y).unwrap();
        assert_eq!(sequential.cv_results(), limited.cv_results());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_worker_pool_sized_by_limit() {
        let gs = GridSearchCv::new(&linear_pipe(), Vec::new());
        assert!(gs.clone().with_n_jobs(Some(1)).worker_pool().unwrap().is_none());
        assert!(gs.clone().with_n_jobs(None).worker_pool().unwrap().is_none());
        let pool = gs.with_n_jobs(Some(3)).worker_pool().unwrap().unwrap();
        assert_eq!(pool.current_num_threads(), 3);
    }

    #[test]
    fn test_predict_before_fit() {
        let gs = GridSearchCv::new(&linear_pipe(), Vec::new());
        assert!(matches!(
            gs.predict(&Frame::from_array(Array2::zeros((1, 1)))),
            Err(Error::NotFitted(_))
        ));
    }
}

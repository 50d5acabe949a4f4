//! # pipegrid: Pipeline Grid-Search Experiment Harness
//!
//! pipegrid builds parameterized regression pipelines, expands every hyperparameter
//! combination, cross-validates each one, and records the scores in a flat result
//! store so that later runs skip configurations that were already tested.
//! Estimators, scaling, fold splitting and scoring come from
//! [aprender](https://docs.rs/aprender); pipegrid adapts them into named,
//! parameter-routed pipeline stages.
//!
//! ## Flow
//!
//! ```text
//! Step ─> Pipe ─> extract_combinations ─> grid_search ─> ResultStore ─> report
//!                                          │  skip if already tested
//!                                          │  GridSearchCv (k-fold, R²)
//!                                          └  test-split MSE / R²
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use pipegrid::combination::{extract_combinations, Pipe, Step};
//! use pipegrid::model::{DecisionTreeRegressor, Stage, StandardScaler};
//! use pipegrid::{data, search, SearchConfig};
//!
//! let dataset = data::Dataset::from_csv("data/train.csv", "critical_temp", &["material"])?;
//! let split = data::train_test_split(&dataset, 0.2, 42)?;
//!
//! let pipe = Pipe::new(vec![
//!     Step::new("scale", Stage::transformer(StandardScaler::new())).param("with_mean", vec![true, false]),
//!     Step::new("tree", Stage::regressor(DecisionTreeRegressor::new())).param("max_depth", vec![Some(4), Some(8), None]),
//! ])?;
//! let mut combinations = extract_combinations(&[pipe])?;
//!
//! let config = SearchConfig::default();
//! let summary = search::grid_search(&config, &split, &mut combinations, "tree")?;
//! println!("evaluated {} / skipped {}", summary.evaluated, summary.skipped);
//! # Ok::<(), pipegrid::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod combination;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod logging;
pub mod model;
pub mod params;
pub mod report;
pub mod search;
pub mod steps;
pub mod store;
pub mod topk;

pub use combination::{extract_combinations, Combination, Pipe, Scores, Step};
pub use config::SearchConfig;
pub use error::{Error, Result};
pub use frame::Frame;
pub use params::{Candidates, ParamKey, ParamSet, ParamValue};
pub use search::{grid_search, SearchSummary};
pub use store::{combination_already_tested, ResultStore};

//! Steps, pipes and the combinations extracted from them
//!
//! ```text
//! Step (tag, stage, candidates) ──┐
//! Step ...                         ├─> Pipe ──extract──> Combination × Π |candidates|
//! Step ...                        ─┘
//! ```
//!
//! All combinations of one pipe share a single immutable [`Pipeline`] behind an
//! [`Arc`]; the search clones it before fitting.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::model::{Pipeline, Stage};
use crate::params::{check_key_part, expand_grid, Candidates, ParamKey, ParamSet};
use crate::store::{ComparableRow, ResultRecord};
use crate::{Error, Result};

/// Separator between step tags in a pipe tag.
pub const TAG_SEPARATOR: &str = " + ";

/// One named pipeline stage with its candidate hyperparameter values.
#[derive(Debug, Clone)]
pub struct Step {
    tag: String,
    constructor: Stage,
    parameters: Vec<(ParamKey, Candidates)>,
}

impl Step {
    /// Create a step without parameters.
    #[must_use]
    pub fn new(tag: impl Into<String>, constructor: Stage) -> Self {
        Self {
            tag: tag.into(),
            constructor,
            parameters: Vec::new(),
        }
    }

    /// Add candidate values for local parameter `name`; a scalar becomes a
    /// one-element list. Declaring the same name twice replaces the earlier list.
    #[must_use]
    pub fn param(mut self, name: &str, values: impl Into<Candidates>) -> Self {
        let key = ParamKey::new(self.tag.clone(), name);
        let values = values.into();
        if let Some(slot) = self.parameters.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = values;
        } else {
            self.parameters.push((key, values));
        }
        self
    }

    /// Step tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Prototype stage.
    #[must_use]
    pub const fn constructor(&self) -> &Stage {
        &self.constructor
    }

    /// Namespaced candidate lists in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[(ParamKey, Candidates)] {
        &self.parameters
    }
}

/// An ordered sequence of steps forming one pipeline shape.
#[derive(Debug, Clone)]
pub struct Pipe {
    steps: Vec<Step>,
}

impl Pipe {
    /// Create a pipe.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when `steps` is empty, two steps share a tag,
    /// a tag or parameter name is empty or contains `"__"`, or a candidate value
    /// could not be matched again after being stored.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::InvalidInput("a pipe needs at least one step".to_string()));
        }
        {
            let mut seen = FxHashSet::default();
            for step in &steps {
                check_key_part("step tag", step.tag())?;
                if !seen.insert(step.tag()) {
                    return Err(Error::InvalidInput(format!(
                        "step tag '{}' appears twice in one pipe",
                        step.tag()
                    )));
                }
                for (key, candidates) in step.parameters() {
                    key.validate()?;
                    candidates.validate()?;
                }
            }
        }
        Ok(Self { steps })
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step tags joined by `" + "`.
    #[must_use]
    pub fn tag(&self) -> String {
        self.steps
            .iter()
            .map(Step::tag)
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR)
    }

    /// All steps' candidate lists, flattened in declaration order.
    #[must_use]
    pub fn parameter_grid(&self) -> Vec<(ParamKey, Candidates)> {
        self.steps
            .iter()
            .flat_map(|s| s.parameters().iter().cloned())
            .collect()
    }

    /// Build the (unfitted) pipeline for this shape.
    ///
    /// # Errors
    ///
    /// Propagates [`Pipeline::new`] validation errors.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        Pipeline::new(
            self.steps
                .iter()
                .map(|s| (s.tag.clone(), s.constructor.clone()))
                .collect(),
        )
    }
}

/// Test-split scores of an evaluated combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Mean squared error on the test split
    pub mse: f64,
    /// R² on the test split
    pub r2: f64,
}

/// One pipeline shape with one fully-resolved parameter assignment.
#[derive(Debug, Clone)]
pub struct Combination {
    tag: String,
    pipeline: Arc<Pipeline>,
    parameters: ParamSet,
    mse: Option<f64>,
    r2: Option<f64>,
}

impl Combination {
    /// Create an unevaluated combination.
    #[must_use]
    pub const fn new(tag: String, pipeline: Arc<Pipeline>, parameters: ParamSet) -> Self {
        Self {
            tag,
            pipeline,
            parameters,
            mse: None,
            r2: None,
        }
    }

    /// Pipe tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Shared pipeline prototype.
    #[must_use]
    pub const fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Resolved parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParamSet {
        &self.parameters
    }

    /// Record the test MSE.
    pub fn set_mse(&mut self, mse: f64) -> &mut Self {
        self.mse = Some(mse);
        self
    }

    /// Record the test R².
    pub fn set_r2(&mut self, r2: f64) -> &mut Self {
        self.r2 = Some(r2);
        self
    }

    /// Both scores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless both MSE and R² have been set.
    pub fn scores(&self) -> Result<Scores> {
        match (self.mse, self.r2) {
            (Some(mse), Some(r2)) => Ok(Scores { mse, r2 }),
            _ => Err(Error::InvalidState(format!(
                "combination '{}' has no MSE/R2 yet: set both before reading them",
                self.tag
            ))),
        }
    }

    /// Result-store row for this evaluated combination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless both scores are set.
    pub fn as_record(&self) -> Result<ResultRecord> {
        let scores = self.scores()?;
        Ok(ResultRecord::new(
            self.tag.clone(),
            scores,
            self.parameters.clone(),
        ))
    }

    /// Projection used to look the combination up in a result store.
    #[must_use]
    pub fn as_comparable(&self) -> ComparableRow {
        ComparableRow::new(&self.tag, &self.parameters)
    }
}

/// Expand every pipe into its combinations.
///
/// For each pipe, in order, one combination is produced per element of the
/// Cartesian product of its steps' candidate lists.
///
/// # Errors
///
/// Returns an error if a pipe's pipeline cannot be built.
pub fn extract_combinations(pipes: &[Pipe]) -> Result<Vec<Combination>> {
    let mut all = Vec::new();
    for pipe in pipes {
        let tag = pipe.tag();
        let pipeline = Arc::new(pipe.build_pipeline()?);
        for parameters in expand_grid(&pipe.parameter_grid()) {
            all.push(Combination::new(tag.clone(), Arc::clone(&pipeline), parameters));
        }
    }
    Ok(all)
}

//! Hyperparameter keys, values and ordered parameter sets
//!
//! Parameters are addressed by a structured [`ParamKey`] (stage, parameter) rather than
//! a hand-built string, so two stages exposing the same local parameter name never collide.
//! The flattened form `"<stage>__<parameter>"` is only produced for display and persistence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Separator between stage tag and parameter name in the flattened key.
pub const KEY_SEPARATOR: &str = "__";

/// Sentinel used for a parameter whose value is explicitly "no value".
///
/// It is a real string so that row comparisons treat it like any other value.
pub const NONE_SENTINEL: &str = "'None'";

/// Namespaced parameter key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParamKey {
    stage: String,
    name: String,
}

impl ParamKey {
    /// Create a key for parameter `name` of stage `stage`.
    #[must_use]
    pub fn new(stage: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            name: name.into(),
        }
    }

    /// Stage tag the parameter belongs to.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Local parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that both parts flatten unambiguously.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either part is empty or contains `"__"`.
    pub fn validate(&self) -> Result<()> {
        check_key_part("step tag", &self.stage)?;
        check_key_part("parameter name", &self.name)
    }
}

/// Reject a stage tag or parameter name that would make the flattened key ambiguous.
///
/// With `"__"` inside a part, stage `a` parameter `b__c` and stage `a__b` parameter
/// `c` would both flatten to the column `a__b__c`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `part` is empty or contains `"__"`.
pub fn check_key_part(what: &str, part: &str) -> Result<()> {
    if part.is_empty() {
        return Err(Error::InvalidInput(format!("{what} must not be empty")));
    }
    if part.contains(KEY_SEPARATOR) {
        return Err(Error::InvalidInput(format!(
            "{what} '{part}' must not contain '{KEY_SEPARATOR}'"
        )));
    }
    Ok(())
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.stage, self.name)
    }
}

impl FromStr for ParamKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(KEY_SEPARATOR) {
            Some((stage, name)) if !stage.is_empty() && !name.is_empty() => {
                Ok(Self::new(stage, name))
            }
            _ => Err(Error::InvalidInput(format!(
                "'{s}' is not a namespaced parameter key (expected '<stage>{KEY_SEPARATOR}<parameter>')"
            ))),
        }
    }
}

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String / categorical value
    Str(String),
    /// Explicit "no value" (persisted as the `'None'` sentinel)
    None,
}

impl ParamValue {
    /// Numeric view of the value (integers are widened).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Non-negative integer view of the value.
    #[must_use]
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Self::Int(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Boolean view of the value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of the value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Whether this is the explicit "no value".
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Check that the value survives a round trip through a persisted result store.
    ///
    /// An empty string is stored as an empty cell and reads back as null, so it never
    /// matches its own stored row again. A string equal to the `'None'` sentinel is
    /// stored exactly like [`ParamValue::None`]. Both are refused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty or sentinel string.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Str(v) if v.is_empty() => Err(Error::InvalidInput(
                "string parameter values must not be empty (use None for no value)".to_string(),
            )),
            Self::Str(v) if v == NONE_SENTINEL => Err(Error::InvalidInput(format!(
                "string parameter value {NONE_SENTINEL} is reserved (use None for no value)"
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::None => f.write_str(NONE_SENTINEL),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ParamValue {
    #[allow(clippy::cast_possible_wrap)]
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}

/// Ordered list of candidate values for one parameter.
///
/// A scalar converts into a one-element list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Candidates(Vec<ParamValue>);

impl Candidates {
    /// Candidate values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[ParamValue] {
        &self.0
    }

    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every candidate value.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParamValue::validate`] failure.
    pub fn validate(&self) -> Result<()> {
        self.0.iter().try_for_each(ParamValue::validate)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for Candidates {
    fn from(values: Vec<T>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

macro_rules! scalar_candidates {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Candidates {
                fn from(value: $t) -> Self {
                    Self(vec![value.into()])
                }
            }
        )*
    };
}

scalar_candidates!(ParamValue, bool, i32, i64, usize, f64, &str, String);

/// Insertion-ordered mapping from [`ParamKey`] to a single resolved value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSet {
    entries: Vec<(ParamKey, ParamValue)>,
}

impl ParamSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the same key in place.
    pub fn insert(&mut self, key: ParamKey, value: ParamValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &ParamKey) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a value by its flattened `"<stage>__<parameter>"` name.
    #[must_use]
    pub fn get_flat(&self, flat: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.to_string() == flat)
            .map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(ParamKey, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (ParamKey, ParamValue)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Expand per-key candidate lists into their Cartesian product.
///
/// Keys keep their order; the last key varies fastest. An empty grid yields a
/// single empty set; any key with no candidates yields no sets at all.
#[must_use]
pub fn expand_grid(grid: &[(ParamKey, Candidates)]) -> Vec<ParamSet> {
    grid.iter().fold(vec![ParamSet::new()], |prefixes, (key, candidates)| {
        prefixes
            .iter()
            .flat_map(|prefix| {
                candidates.values().iter().map(move |value| {
                    let mut set = prefix.clone();
                    set.insert(key.clone(), value.clone());
                    set
                })
            })
            .collect()
    })
}

//! Dataset-specific transform steps
//!
//! Each step implements [`crate::model::Transformer`] and can sit at any transform
//! position of a [`crate::model::Pipeline`].

mod correlation;
mod subset;

pub use correlation::{abs_correlation_matrix, HighCorrFeaturesRemover};
pub use subset::{
    CsvFeatureFamilies, FeatureFamilies, OnlyFormula, OnlyProperties, FORMULA_FILE,
    MATERIAL_COLUMN, PROPERTIES_FILE, TARGET_COLUMN,
};

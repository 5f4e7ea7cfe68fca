//! Categorical encoding
//!
//! Two encoders, fitted on a training subset and applied unchanged to any
//! other subset:
//!
//! * [`TargetEncoder`] replaces a category by a blend of its mean target and
//!   the global mean, leaning on the global mean while the category is rare.
//! * [`OrdinalEncoder`] maps each category to its rank among the sorted
//!   categories seen at fit time, and unseen ones to a sentinel.
//!
//! Neither `transform` takes a target, so nothing about the rows being scored
//! can leak into their encoding.
use crate::config::EncoderConfig;
use crate::constants::UNKNOWN_ORDINAL;
use crate::data::NumericFrame;
use crate::errors::PipelineError;
use crate::features::{DerivedFrame, FeatureSchema};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Smoothed target-mean encoder for nominal columns.
#[derive(Debug, Clone)]
pub struct TargetEncoder {
    pub smoothing: f64,
    pub min_samples_leaf: usize,
}

/// Learned mapping for one column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetMapping {
    pub values: HashMap<String, f64>,
    /// Encoding of the missing category, if it was seen during fit.
    pub missing: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FittedTargetEncoder {
    /// Global target mean, used for unseen categories.
    pub prior: f64,
    pub mappings: Vec<TargetMapping>,
}

impl TargetEncoder {
    pub fn new(config: &EncoderConfig) -> Self {
        TargetEncoder {
            smoothing: config.smoothing,
            min_samples_leaf: config.min_samples_leaf,
        }
    }

    /// Weight given to the category mean, for a category seen `count` times.
    #[inline]
    pub fn weight(&self, count: usize) -> f64 {
        1.0 / (1.0 + (-(count as f64 - self.min_samples_leaf as f64) / self.smoothing).exp())
    }

    pub fn fit(&self, columns: &[Vec<Option<String>>], y: &[f64]) -> Result<FittedTargetEncoder, PipelineError> {
        if y.is_empty() {
            return Err(PipelineError::EmptyData("cannot fit a target encoder without rows".to_string()));
        }
        let prior = y.iter().sum::<f64>() / y.len() as f64;
        let mappings = columns
            .iter()
            .map(|column| {
                if column.len() != y.len() {
                    return Err(PipelineError::InvalidParameter(
                        "target".to_string(),
                        format!("{} values", column.len()),
                        format!("{} values", y.len()),
                    ));
                }
                let mut stats: HashMap<Option<&str>, (f64, usize)> = HashMap::new();
                for (v, y_) in column.iter().zip(y) {
                    let e = stats.entry(v.as_deref()).or_insert((0.0, 0));
                    e.0 += y_;
                    e.1 += 1;
                }
                let mut mapping = TargetMapping {
                    values: HashMap::with_capacity(stats.len()),
                    missing: None,
                };
                for (category, (sum, count)) in stats {
                    let w = self.weight(count);
                    let value = prior * (1.0 - w) + (sum / count as f64) * w;
                    match category {
                        Some(c) => {
                            mapping.values.insert(c.to_string(), value);
                        }
                        None => mapping.missing = Some(value),
                    }
                }
                Ok(mapping)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FittedTargetEncoder { prior, mappings })
    }
}

impl FittedTargetEncoder {
    pub fn transform(&self, columns: &[Vec<Option<String>>]) -> Result<Vec<Vec<f64>>, PipelineError> {
        if columns.len() != self.mappings.len() {
            return Err(PipelineError::SchemaMismatch(
                format!("{} target encoded columns", columns.len()),
                format!("{} target encoded columns", self.mappings.len()),
            ));
        }
        Ok(columns
            .iter()
            .zip(&self.mappings)
            .map(|(column, mapping)| {
                column
                    .iter()
                    .map(|v| match v {
                        Some(c) => mapping.values.get(c.as_str()).copied().unwrap_or(self.prior),
                        None => mapping.missing.unwrap_or(self.prior),
                    })
                    .collect()
            })
            .collect())
    }
}

/// Integer coding for small fixed-domain columns.
#[derive(Debug, Clone)]
pub struct OrdinalEncoder {
    /// Code given to categories not seen during fit.
    pub unknown_value: f64,
}

impl Default for OrdinalEncoder {
    fn default() -> Self {
        OrdinalEncoder {
            unknown_value: UNKNOWN_ORDINAL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FittedOrdinalEncoder {
    /// Sorted categories for each column.
    pub categories: Vec<Vec<String>>,
    pub unknown_value: f64,
}

impl OrdinalEncoder {
    pub fn fit(&self, columns: &[Vec<Option<String>>]) -> FittedOrdinalEncoder {
        let categories = columns
            .iter()
            .map(|column| {
                let mut cats: Vec<String> = column.iter().flatten().cloned().collect();
                cats.sort_unstable();
                cats.dedup();
                cats
            })
            .collect();
        FittedOrdinalEncoder {
            categories,
            unknown_value: self.unknown_value,
        }
    }
}

impl FittedOrdinalEncoder {
    /// Missing values stay missing for the imputer.
    pub fn transform(&self, columns: &[Vec<Option<String>>]) -> Result<Vec<Vec<f64>>, PipelineError> {
        if columns.len() != self.categories.len() {
            return Err(PipelineError::SchemaMismatch(
                format!("{} ordinal columns", columns.len()),
                format!("{} ordinal columns", self.categories.len()),
            ));
        }
        Ok(columns
            .iter()
            .zip(&self.categories)
            .map(|(column, cats)| {
                column
                    .iter()
                    .map(|v| match v {
                        Some(c) => match cats.binary_search(c) {
                            Ok(i) => i as f64,
                            Err(_) => self.unknown_value,
                        },
                        None => f64::NAN,
                    })
                    .collect()
            })
            .collect())
    }
}

/// Target and ordinal encoders fitted together against one [`FeatureSchema`].
#[derive(Debug, Clone)]
pub struct FittedCategoricalEncoder {
    pub schema: FeatureSchema,
    pub target: FittedTargetEncoder,
    pub ordinal: FittedOrdinalEncoder,
}

impl FittedCategoricalEncoder {
    pub fn fit(frame: &DerivedFrame, y: &[f64], config: &EncoderConfig) -> Result<Self, PipelineError> {
        Ok(FittedCategoricalEncoder {
            schema: frame.schema.clone(),
            target: TargetEncoder::new(config).fit(&frame.target_encoded, y)?,
            ordinal: OrdinalEncoder::default().fit(&frame.ordinal),
        })
    }

    /// Encode `frame` into an all-numeric frame whose columns follow
    /// [`FeatureSchema::columns`].
    pub fn transform(&self, frame: &DerivedFrame) -> Result<NumericFrame, PipelineError> {
        if frame.schema != self.schema {
            return Err(PipelineError::SchemaMismatch(
                frame.schema.columns().join(", "),
                self.schema.columns().join(", "),
            ));
        }
        let target = self.target.transform(&frame.target_encoded)?;
        let ordinal = self.ordinal.transform(&frame.ordinal)?;
        let columns = self
            .schema
            .columns()
            .into_iter()
            .zip(frame.numeric.iter().cloned().chain(target).chain(ordinal))
            .collect();
        NumericFrame::from_columns(columns)
    }
}

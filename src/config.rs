//! Pipeline Configuration
//!
//! Everything the pipeline needs to know lives in [`PipelineConfig`]: where the
//! data is, which columns play which role, how the encoders are tuned, how the
//! holdout split is drawn, which quantiles bound the interval, which boosting
//! backends are trained and how. Every field has a default, so a partial JSON
//! document is a valid configuration.
use crate::backend::Backend;
use crate::constants::*;
use crate::errors::PipelineError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_train_path() -> PathBuf {
    PathBuf::from(TRAIN_PATH)
}
fn default_test_path() -> PathBuf {
    PathBuf::from(TEST_PATH)
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(OUTPUT_DIR)
}
fn default_id_column() -> String {
    "id".to_string()
}
fn default_target_column() -> String {
    "sale_price".to_string()
}
fn default_date_column() -> String {
    "sale_date".to_string()
}
fn default_target_encoded_columns() -> Vec<String> {
    to_strings(&["city", "zoning", "subdivision", "join_status"])
}
fn default_ordinal_columns() -> Vec<String> {
    to_strings(&["submarket"])
}
fn default_drop_columns() -> Vec<String> {
    to_strings(&[
        // Identifiers and location.
        "id",
        "sale_warning",
        "latitude",
        "longitude",
        // Raw inputs consumed by the derived features, and weak columns.
        "join_year",
        "sale_date",
        "sqft_lot",
        "garb_sqft",
        "gara_sqft",
        "bath_full",
        "bath_3qtr",
        "bath_half",
        "beds",
        "present_use",
        "sale_day",
        "sqft_1",
        "imp_val",
        "year_reno",
        "fbsmt_grade",
        "view_otherwater",
        "sale_nbr",
        "view_sound",
        "grade",
    ])
}
fn default_smoothing() -> f64 {
    TARGET_SMOOTHING
}
fn default_min_samples_leaf() -> usize {
    TARGET_MIN_SAMPLES_LEAF
}
fn default_test_size() -> f64 {
    TEST_SIZE
}
fn default_seed() -> u64 {
    SEED
}
fn default_lower_quantile() -> f64 {
    LOWER_QUANTILE
}
fn default_upper_quantile() -> f64 {
    UPPER_QUANTILE
}
fn default_backends() -> Vec<Backend> {
    Backend::all().to_vec()
}
fn default_log_iterations() -> usize {
    100
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_train_path")]
    pub train_path: PathBuf,
    #[serde(default = "default_test_path")]
    pub test_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            train_path: default_train_path(),
            test_path: default_test_path(),
            output_dir: default_output_dir(),
        }
    }
}

/// Column roles.
///
/// Columns not named here, and not consumed by the feature transform, pass
/// through as numeric features unless they appear in `drop_columns`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaConfig {
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_target_column")]
    pub target_column: String,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_target_encoded_columns")]
    pub target_encoded_columns: Vec<String>,
    #[serde(default = "default_ordinal_columns")]
    pub ordinal_columns: Vec<String>,
    /// Raw or derived columns removed from the feature set.
    #[serde(default = "default_drop_columns")]
    pub drop_columns: Vec<String>,
}

impl SchemaConfig {
    pub fn is_dropped(&self, name: &str) -> bool {
        self.drop_columns.iter().any(|c| c == name)
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.target_encoded_columns.iter().chain(&self.ordinal_columns).any(|c| c == name)
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        SchemaConfig {
            id_column: default_id_column(),
            target_column: default_target_column(),
            date_column: default_date_column(),
            target_encoded_columns: default_target_encoded_columns(),
            ordinal_columns: default_ordinal_columns(),
            drop_columns: default_drop_columns(),
        }
    }
}

/// Target encoder tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncoderConfig {
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            smoothing: default_smoothing(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

/// Holdout split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplitConfig {
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_size: default_test_size(),
            seed: default_seed(),
        }
    }
}

/// Quantiles bounding the prediction interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntervalConfig {
    #[serde(default = "default_lower_quantile")]
    pub lower_quantile: f64,
    #[serde(default = "default_upper_quantile")]
    pub upper_quantile: f64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        IntervalConfig {
            lower_quantile: default_lower_quantile(),
            upper_quantile: default_upper_quantile(),
        }
    }
}

/// Overrides applied on top of the backend defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingConfig {
    /// Boosting rounds for every backend, instead of each backend's own.
    #[serde(default)]
    pub iterations: Option<usize>,
    /// Log booster progress every n rounds, 0 disables it.
    #[serde(default = "default_log_iterations")]
    pub log_iterations: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            iterations: None,
            log_iterations: default_log_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub interval: IntervalConfig,
    #[serde(default = "default_backends")]
    pub backends: Vec<Backend>,
    #[serde(default)]
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data: DataConfig::default(),
            schema: SchemaConfig::default(),
            encoder: EncoderConfig::default(),
            split: SplitConfig::default(),
            interval: IntervalConfig::default(),
            backends: default_backends(),
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check the numeric settings before anything is read from disk.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let open_unit = |value: f64, name: &str| {
            if value.is_nan() || value <= 0.0 || value >= 1.0 {
                Err(PipelineError::InvalidParameter(
                    name.to_string(),
                    "a value strictly between 0 and 1".to_string(),
                    value.to_string(),
                ))
            } else {
                Ok(())
            }
        };
        open_unit(self.split.test_size, "test_size")?;
        open_unit(self.interval.lower_quantile, "lower_quantile")?;
        open_unit(self.interval.upper_quantile, "upper_quantile")?;
        if self.interval.lower_quantile >= self.interval.upper_quantile {
            return Err(PipelineError::InvalidParameter(
                "upper_quantile".to_string(),
                format!("a value above lower_quantile {}", self.interval.lower_quantile),
                self.interval.upper_quantile.to_string(),
            ));
        }
        if self.encoder.smoothing.is_nan() || self.encoder.smoothing <= 0.0 {
            return Err(PipelineError::InvalidParameter(
                "smoothing".to_string(),
                "a positive value".to_string(),
                self.encoder.smoothing.to_string(),
            ));
        }
        if self.training.iterations == Some(0) {
            return Err(PipelineError::InvalidParameter(
                "iterations".to_string(),
                "at least one boosting round".to_string(),
                "0".to_string(),
            ));
        }
        if self.backends.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "backends".to_string(),
                "at least one backend".to_string(),
                "none".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save and load configuration objects as json.
pub trait ConfigIO: Serialize + DeserializeOwned {
    /// Dump the object as a json string.
    fn json_dump(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load the object from a json string.
    fn from_json(json_str: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str::<Self>(json_str)?)
    }

    /// Save the object to a file.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let json = self.json_dump()?;
        fs::write(path.as_ref(), json)
            .map_err(|e| PipelineError::UnableToWrite(path.as_ref().display().to_string(), e.to_string()))
    }

    /// Load the object from a file.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let json_str = fs::read_to_string(path.as_ref())
            .map_err(|e| PipelineError::UnableToRead(path.as_ref().display().to_string(), e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for PipelineConfig {}

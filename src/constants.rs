pub const SEED: u64 = 42;
pub const TEST_SIZE: f64 = 0.2;

pub const LOWER_QUANTILE: f64 = 0.1;
pub const UPPER_QUANTILE: f64 = 0.9;

pub const TARGET_SMOOTHING: f64 = 20.0;
pub const TARGET_MIN_SAMPLES_LEAF: usize = 50;
pub const UNKNOWN_ORDINAL: f64 = -1.0;

pub const MAX_BIN: u16 = 255;
pub const MISSING_BIN: u16 = 0;

pub const TRAIN_PATH: &str = "data/dataset.csv";
pub const TEST_PATH: &str = "data/test.csv";
pub const OUTPUT_DIR: &str = "artifacts";

pub const METRICS_FILE: &str = "metrics_validation.csv";
pub const DATASET_FINAL_FILE: &str = "dataset_Final.csv";
pub const TEST_FINAL_FILE: &str = "test_Final.csv";
pub const CONFIG_FILE: &str = "config.json";

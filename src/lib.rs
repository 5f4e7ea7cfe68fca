// Modules
pub mod backend;
pub mod binning;
pub mod booster;
pub mod config;
pub mod constants;
pub mod data;
pub mod encoding;
pub mod errors;
pub mod features;
pub mod grower;
pub mod histogram;
pub mod holdout;
pub mod imputer;
pub mod metrics;
pub mod objective;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod splitter;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use backend::{Backend, QuantilePair};
pub use booster::{BoosterConfig, QuantileBooster};
pub use config::{ConfigIO, PipelineConfig};
pub use data::{Matrix, NumericFrame};
pub use errors::PipelineError;
pub use grower::GrowPolicy;
pub use pipeline::{Pipeline, RunSummary};

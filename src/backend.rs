//! Backends
//!
//! A backend is a tree-growth policy plus the hyperparameters it is trained
//! with. Every backend produces a [`QuantilePair`]: two independently fitted
//! boosters, one per interval bound.
use crate::booster::{BoosterConfig, QuantileBooster};
use crate::constants::MAX_BIN;
use crate::data::Matrix;
use crate::errors::PipelineError;
use crate::grower::GrowPolicy;
use crate::utils::items_to_strings;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Best-first leaf growth bounded by a leaf budget.
    LeafWise,
    /// Level-by-level growth bounded by depth.
    DepthWise,
    /// Symmetric trees sharing one split per level.
    Oblivious,
}

impl Backend {
    pub fn all() -> [Backend; 3] {
        [Backend::LeafWise, Backend::DepthWise, Backend::Oblivious]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::LeafWise => "LeafWise",
            Backend::DepthWise => "DepthWise",
            Backend::Oblivious => "Oblivious",
        }
    }

    /// Booster settings this backend trains the `quantile` bound with.
    pub fn booster_config(&self, quantile: f64, seed: u64) -> BoosterConfig {
        let (policy, iterations, min_leaf, lambda, subsample) = match self {
            Backend::LeafWise => (
                GrowPolicy::LeafWise {
                    max_leaves: 31,
                    max_depth: None,
                },
                400,
                20,
                1.0,
                0.8,
            ),
            Backend::DepthWise => (GrowPolicy::DepthWise { max_depth: 6 }, 400, 10, 1.0, 0.8),
            Backend::Oblivious => (GrowPolicy::Oblivious { depth: 6 }, 600, 1, 3.0, 1.0),
        };
        BoosterConfig {
            quantile,
            policy,
            iterations,
            learning_rate: 0.05,
            max_bin: MAX_BIN,
            min_leaf,
            lambda,
            min_gain: 0.0,
            row_subsample: subsample,
            col_subsample: subsample,
            seed,
            log_iterations: 0,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LeafWise" => Ok(Backend::LeafWise),
            "DepthWise" => Ok(Backend::DepthWise),
            "Oblivious" => Ok(Backend::Oblivious),
            _ => Err(PipelineError::ParseString(
                s.to_string(),
                "Backend".to_string(),
                items_to_strings(Backend::all().iter().map(|b| b.name()).collect()),
            )),
        }
    }
}

/// Fix crossed bounds in place: wherever `lower > upper` the two are swapped.
pub fn order_bounds(lower: &mut [f64], upper: &mut [f64]) {
    lower.iter_mut().zip(upper.iter_mut()).for_each(|(l, u)| {
        if *l > *u {
            std::mem::swap(l, u);
        }
    });
}

/// Lower and upper quantile boosters of one backend.
pub struct QuantilePair {
    pub backend: Backend,
    pub lower: QuantileBooster,
    pub upper: QuantileBooster,
}

impl QuantilePair {
    /// Build the untrained pair from the backend defaults.
    pub fn new(backend: Backend, lower_quantile: f64, upper_quantile: f64, seed: u64) -> Result<Self, PipelineError> {
        Self::from_configs(
            backend,
            backend.booster_config(lower_quantile, seed),
            backend.booster_config(upper_quantile, seed),
        )
    }

    pub fn from_configs(backend: Backend, lower: BoosterConfig, upper: BoosterConfig) -> Result<Self, PipelineError> {
        Ok(QuantilePair {
            backend,
            lower: QuantileBooster::new(lower)?,
            upper: QuantileBooster::new(upper)?,
        })
    }

    /// Fit both bounds on the same data.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), PipelineError> {
        info!("{}: fitting quantile {}", self.backend, self.lower.cfg.quantile);
        self.lower.fit(data, y)?;
        info!("{}: fitting quantile {}", self.backend, self.upper.cfg.quantile);
        self.upper.fit(data, y)?;
        Ok(())
    }

    /// Lower and upper bounds for every row, with crossed bounds swapped.
    pub fn predict_interval(&self, data: &Matrix<f64>) -> (Vec<f64>, Vec<f64>) {
        let mut lower = self.lower.predict(data, true);
        let mut upper = self.upper.predict(data, true);
        order_bounds(&mut lower, &mut upper);
        (lower, upper)
    }
}

//! Quantile booster
//!
//! Histogram gradient boosting of the pinball loss. Each round computes the
//! loss gradients, grows one tree on a row/column sample under the configured
//! [`GrowPolicy`], then renews every leaf: its value becomes the learning
//! rate times the target quantile of the residuals of the rows it holds.
use crate::binning::bin_matrix;
use crate::constants::MAX_BIN;
use crate::data::Matrix;
use crate::errors::PipelineError;
use crate::grower::{grow_tree, GrowContext, GrowPolicy};
use crate::objective::QuantileLoss;
use crate::splitter::SplitParams;
use crate::tree::Tree;
use crate::utils::validate_float_parameter;
use log::info;
use rand::rngs::StdRng;
use rand::seq::{index, IteratorRandom};
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

fn default_max_bin() -> u16 {
    MAX_BIN
}
fn default_log_iterations() -> usize {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoosterConfig {
    /// Quantile of the target the booster estimates.
    pub quantile: f64,
    pub policy: GrowPolicy,
    /// Number of boosting rounds.
    pub iterations: usize,
    pub learning_rate: f64,
    #[serde(default = "default_max_bin")]
    pub max_bin: u16,
    /// Smallest number of rows in a child.
    pub min_leaf: u32,
    /// L2 regularization on leaf row counts.
    pub lambda: f64,
    pub min_gain: f64,
    /// Share of rows sampled for each tree.
    pub row_subsample: f64,
    /// Share of features sampled for each tree.
    pub col_subsample: f64,
    pub seed: u64,
    /// Log progress every n rounds, 0 disables it.
    #[serde(default = "default_log_iterations")]
    pub log_iterations: usize,
}

impl BoosterConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.quantile > 0.0 && self.quantile < 1.0) {
            return Err(PipelineError::InvalidParameter(
                "quantile".to_string(),
                "a value strictly between 0 and 1".to_string(),
                self.quantile.to_string(),
            ));
        }
        validate_float_parameter(self.learning_rate, f64::MIN_POSITIVE, 1.0, "learning_rate")?;
        validate_float_parameter(self.row_subsample, f64::MIN_POSITIVE, 1.0, "row_subsample")?;
        validate_float_parameter(self.col_subsample, f64::MIN_POSITIVE, 1.0, "col_subsample")?;
        validate_float_parameter(self.lambda, 0.0, f64::INFINITY, "lambda")?;
        validate_float_parameter(self.min_gain, 0.0, f64::INFINITY, "min_gain")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantileBooster {
    pub cfg: BoosterConfig,
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl QuantileBooster {
    pub fn new(cfg: BoosterConfig) -> Result<Self, PipelineError> {
        cfg.validate()?;
        Ok(QuantileBooster {
            cfg,
            base_score: f64::NAN,
            trees: Vec::new(),
        })
    }

    /// Fit the booster on `data` and target `y`, replacing any earlier fit.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64]) -> Result<(), PipelineError> {
        if data.rows == 0 || data.cols == 0 {
            return Err(PipelineError::EmptyData("cannot fit a booster on an empty matrix".to_string()));
        }
        if y.len() != data.rows {
            return Err(PipelineError::InvalidParameter(
                "y".to_string(),
                format!("{} values", data.rows),
                format!("{} values", y.len()),
            ));
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidParameter(
                "y".to_string(),
                "finite target values".to_string(),
                "a missing or infinite value".to_string(),
            ));
        }
        let start = Instant::now();
        let objective = QuantileLoss::new(self.cfg.quantile);
        let binned = bin_matrix(data, self.cfg.max_bin)?;
        let params = SplitParams {
            lambda: self.cfg.lambda,
            min_leaf: self.cfg.min_leaf.max(1),
            min_gain: self.cfg.min_gain,
        };
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let col_index: Vec<usize> = (0..data.cols).collect();
        let row_amount = ((data.rows as f64 * self.cfg.row_subsample).ceil() as usize).clamp(1, data.rows);
        let col_amount = ((data.cols as f64 * self.cfg.col_subsample).ceil() as usize).clamp(1, data.cols);

        self.base_score = objective.initial_value(y);
        self.trees = Vec::with_capacity(self.cfg.iterations);
        let mut yhat = vec![self.base_score; data.rows];

        for i in 0..self.cfg.iterations {
            let grad = objective.gradient(y, &yhat);

            let mut rows: Vec<usize> = if row_amount == data.rows {
                data.index.to_owned()
            } else {
                index::sample(&mut rng, data.rows, row_amount).into_vec()
            };
            let col_index_sample: Vec<usize> = if col_amount == data.cols {
                col_index.clone()
            } else {
                let mut v: Vec<usize> = col_index.iter().copied().choose_multiple(&mut rng, col_amount);
                v.sort();
                v
            };

            let ctx = GrowContext {
                binned: &binned,
                grad: &grad,
                col_index: &col_index_sample,
                params,
            };
            let (mut tree, leaves) = grow_tree(&self.cfg.policy, &ctx, &mut rows);
            for leaf in leaves {
                let value = objective.leaf_value(y, &yhat, &rows[leaf.start..leaf.stop]);
                tree.nodes[leaf.node].weight_value = self.cfg.learning_rate * value;
            }

            self.update_predictions_inplace(&mut yhat, &tree, data);

            if self.cfg.log_iterations > 0 && i % self.cfg.log_iterations == 0 {
                let loss = objective.loss(y, &yhat);
                info!(
                    "round {:0?}, tree.nodes: {:1?}, tree.depth: {:2?}, loss: {:3?}",
                    i,
                    tree.nodes.len(),
                    tree.depth,
                    loss.iter().sum::<f64>() / loss.len() as f64,
                );
            }
            self.trees.push(tree);
        }

        if self.cfg.log_iterations > 0 {
            info!(
                "Finished training a booster with {0} trees in {1} seconds.",
                self.trees.len(),
                start.elapsed().as_secs()
            );
        }
        Ok(())
    }

    fn update_predictions_inplace(&self, yhat: &mut [f64], tree: &Tree, data: &Matrix<f64>) {
        let preds = tree.predict(data, true);
        yhat.iter_mut().zip(preds).for_each(|(i, j)| *i += j);
    }

    /// Predict with the fitted booster.
    ///
    /// * `data` - Either training data, or data to predict on.
    /// * `parallel` - Predict rows in parallel.
    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        let row = |r: &usize| self.base_score + self.trees.iter().map(|t| t.predict_row(data, *r)).sum::<f64>();
        if parallel {
            data.index.par_iter().map(row).collect()
        } else {
            data.index.iter().map(row).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(quantile: f64, policy: GrowPolicy) -> BoosterConfig {
        BoosterConfig {
            quantile,
            policy,
            iterations: 60,
            learning_rate: 0.2,
            max_bin: 64,
            min_leaf: 5,
            lambda: 1.0,
            min_gain: 0.0,
            row_subsample: 1.0,
            col_subsample: 1.0,
            seed: 0,
            log_iterations: 0,
        }
    }

    // y = 10 * x0 plus a deterministic spread of +-5; x1 is noise.
    fn dataset() -> (Vec<f64>, Vec<f64>) {
        let n = 400;
        let x0: Vec<f64> = (0..n).map(|i| f64::from(i % 20)).collect();
        let x1: Vec<f64> = (0..n).map(|i| f64::from((i * 37) % 11)).collect();
        let y: Vec<f64> = (0..n).map(|i| 10.0 * f64::from(i % 20) + f64::from((i / 20) % 11) - 5.0).collect();
        (x0.into_iter().chain(x1).collect(), y)
    }

    fn coverage_below(y: &[f64], pred: &[f64]) -> f64 {
        y.iter().zip(pred).filter(|(a, b)| a <= b).count() as f64 / y.len() as f64
    }

    #[test]
    fn test_quantile_boosters_track_their_quantile() {
        let (data_vec, y) = dataset();
        let data = Matrix::new(&data_vec, y.len(), 2);
        for policy in [
            GrowPolicy::LeafWise {
                max_leaves: 16,
                max_depth: None,
            },
            GrowPolicy::DepthWise { max_depth: 4 },
            GrowPolicy::Oblivious { depth: 4 },
        ] {
            let mut low = QuantileBooster::new(config(0.1, policy)).unwrap();
            let mut high = QuantileBooster::new(config(0.9, policy)).unwrap();
            low.fit(&data, &y).unwrap();
            high.fit(&data, &y).unwrap();
            let l = low.predict(&data, true);
            let h = high.predict(&data, false);
            let below_low = coverage_below(&y, &l);
            let below_high = coverage_below(&y, &h);
            assert!(below_low < 0.3, "{:?}: {}", policy, below_low);
            assert!(below_high > 0.7, "{:?}: {}", policy, below_high);
            // The trees pick up the trend in x0.
            let mean_width: f64 = l.iter().zip(&h).map(|(a, b)| b - a).sum::<f64>() / l.len() as f64;
            assert!(mean_width < 30.0, "{:?}: {}", policy, mean_width);
        }
    }

    #[test]
    fn test_predict_parallel_matches_serial() {
        let (data_vec, y) = dataset();
        let data = Matrix::new(&data_vec, y.len(), 2);
        let mut cfg = config(0.5, GrowPolicy::DepthWise { max_depth: 3 });
        cfg.row_subsample = 0.7;
        cfg.col_subsample = 0.5;
        cfg.iterations = 10;
        let mut model = QuantileBooster::new(cfg).unwrap();
        model.fit(&data, &y).unwrap();
        assert_eq!(model.trees.len(), 10);
        assert_eq!(model.predict(&data, true), model.predict(&data, false));
    }

    #[test]
    fn test_fit_is_reproducible() {
        let (data_vec, y) = dataset();
        let data = Matrix::new(&data_vec, y.len(), 2);
        let mut cfg = config(0.9, GrowPolicy::LeafWise {
            max_leaves: 8,
            max_depth: Some(3),
        });
        cfg.row_subsample = 0.5;
        cfg.iterations = 5;
        let mut a = QuantileBooster::new(cfg.clone()).unwrap();
        let mut b = QuantileBooster::new(cfg).unwrap();
        a.fit(&data, &y).unwrap();
        b.fit(&data, &y).unwrap();
        assert_eq!(a.trees, b.trees);
        assert!(a.trees.iter().all(|t| t.depth <= 3 && t.n_leaves() <= 8));
    }

    #[test]
    fn test_invalid_configs() {
        let policy = GrowPolicy::DepthWise { max_depth: 3 };
        assert!(QuantileBooster::new(config(1.0, policy)).is_err());
        let mut cfg = config(0.5, policy);
        cfg.learning_rate = 0.0;
        assert!(QuantileBooster::new(cfg).is_err());
        let mut cfg = config(0.5, policy);
        cfg.row_subsample = 1.5;
        assert!(QuantileBooster::new(cfg).is_err());
    }

    #[test]
    fn test_fit_rejects_bad_targets() {
        let (data_vec, mut y) = dataset();
        let data = Matrix::new(&data_vec, y.len(), 2);
        let mut model = QuantileBooster::new(config(0.5, GrowPolicy::Oblivious { depth: 2 })).unwrap();
        assert!(model.fit(&data, &y[1..]).is_err());
        y[3] = f64::NAN;
        assert!(model.fit(&data, &y).is_err());
    }
}

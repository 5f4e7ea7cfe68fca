//! Quantile Loss function for quantile regression.

use crate::utils::quantile_inplace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
/// Quantile Loss (pinball loss), targets a specific quantile of the conditional distribution.
pub struct QuantileLoss {
    /// Target quantile in `(0, 1)`. For example, `0.5` for the median.
    pub quantile: f64,
}

impl QuantileLoss {
    pub fn new(quantile: f64) -> Self {
        QuantileLoss { quantile }
    }

    /// Pinball loss of a single prediction.
    #[inline]
    pub fn loss_single(&self, y: f64, yhat: f64) -> f64 {
        let s = y - yhat;
        if s >= 0.0 {
            self.quantile * s
        } else {
            (self.quantile - 1.0) * s
        }
    }

    pub fn loss(&self, y: &[f64], yhat: &[f64]) -> Vec<f64> {
        y.iter().zip(yhat).map(|(y_, yhat_)| self.loss_single(*y_, *yhat_)).collect()
    }

    /// Gradient with respect to `yhat`; the hessian is constant.
    pub fn gradient(&self, y: &[f64], yhat: &[f64]) -> Vec<f64> {
        y.iter()
            .zip(yhat)
            .map(|(y_, yhat_)| {
                if yhat_ >= y_ {
                    1.0 - self.quantile
                } else {
                    -self.quantile
                }
            })
            .collect()
    }

    /// Starting prediction: the target's own quantile.
    pub fn initial_value(&self, y: &[f64]) -> f64 {
        let mut v = y.to_vec();
        quantile_inplace(&mut v, self.quantile)
    }

    /// Leaf value minimizing the loss over `rows`: the quantile of their residuals.
    pub fn leaf_value(&self, y: &[f64], yhat: &[f64], rows: &[usize]) -> f64 {
        if rows.is_empty() {
            return 0.0;
        }
        let mut residuals: Vec<f64> = rows.iter().map(|&r| y[r] - yhat[r]).collect();
        quantile_inplace(&mut residuals, self.quantile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_loss() {
        let y = vec![1.0, 1.0];
        let yhat = vec![2.0, 0.5];
        let loss_fn = QuantileLoss::new(0.7);

        // y - yhat = -1.0 < 0 -> (0.7 - 1) * -1.0 = 0.3
        // y - yhat = 0.5 >= 0 -> 0.7 * 0.5 = 0.35
        let l = loss_fn.loss(&y, &yhat);
        assert!((l[0] - 0.3).abs() < 1e-12);
        assert!((l[1] - 0.35).abs() < 1e-12);

        // yhat >= y -> 1 - q, yhat < y -> -q
        let g = loss_fn.gradient(&y, &yhat);
        assert!((g[0] - 0.3).abs() < 1e-12);
        assert!((g[1] - (-0.7)).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_initial_value() {
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(QuantileLoss::new(0.5).initial_value(&y), 3.0);
        assert_eq!(QuantileLoss::new(0.8).initial_value(&y), 4.0);
    }

    #[test]
    fn test_leaf_value() {
        let y = vec![10.0, 20.0, 30.0, 40.0];
        let yhat = vec![0.0, 0.0, 0.0, 100.0];
        let loss_fn = QuantileLoss::new(0.9);
        assert_eq!(loss_fn.leaf_value(&y, &yhat, &[0, 1, 2]), 30.0);
        assert_eq!(loss_fn.leaf_value(&y, &yhat, &[3]), -60.0);
        assert_eq!(loss_fn.leaf_value(&y, &yhat, &[]), 0.0);
    }
}

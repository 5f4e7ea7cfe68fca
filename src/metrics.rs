//! Interval metrics
//!
//! Scores a predicted interval `[lower, upper]` against the observed targets.
use serde::{Deserialize, Serialize};

/// Mean pinball loss of predictions `yhat` at quantile `alpha`.
pub fn pinball(y: &[f64], yhat: &[f64], alpha: f64) -> f64 {
    let res = y
        .iter()
        .zip(yhat)
        .map(|(y_, yhat_)| {
            let d = y_ - yhat_;
            (alpha * d).max((alpha - 1.0) * d)
        })
        .sum::<f64>();
    res / y.len() as f64
}

/// Share of targets inside their interval, bounds included.
pub fn coverage(y: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    let inside = y
        .iter()
        .zip(lower.iter().zip(upper))
        .filter(|(y_, (l, u))| **y_ >= **l && **y_ <= **u)
        .count();
    inside as f64 / y.len() as f64
}

pub fn average_width(lower: &[f64], upper: &[f64]) -> f64 {
    lower.iter().zip(upper).map(|(l, u)| u - l).sum::<f64>() / lower.len() as f64
}

/// Mean absolute error of the interval midpoint.
pub fn mae_midpoint(y: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    y.iter()
        .zip(lower.iter().zip(upper))
        .map(|(y_, (l, u))| (y_ - (l + u) / 2.0).abs())
        .sum::<f64>()
        / y.len() as f64
}

/// One row of the validation metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalMetrics {
    pub model: String,
    pub coverage: f64,
    pub avg_width: f64,
    pub mae_mid: f64,
    pub pinball10: f64,
    pub pinball90: f64,
}

impl IntervalMetrics {
    /// Score the interval of `model`. The lower bound is scored at
    /// `lower_quantile` and the upper bound at `upper_quantile`.
    pub fn evaluate(
        model: &str,
        y: &[f64],
        lower: &[f64],
        upper: &[f64],
        lower_quantile: f64,
        upper_quantile: f64,
    ) -> Self {
        IntervalMetrics {
            model: model.to_string(),
            coverage: coverage(y, lower, upper),
            avg_width: average_width(lower, upper),
            mae_mid: mae_midpoint(y, lower, upper),
            pinball10: pinball(y, lower, lower_quantile),
            pinball90: pinball(y, upper, upper_quantile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinball() {
        let y = vec![10.0, 10.0];
        // d = 2 -> 0.1 * 2, d = -2 -> 0.9 * 2
        let p = pinball(&y, &[8.0, 12.0], 0.1);
        assert!((p - (0.2 + 1.8) / 2.0).abs() < 1e-12);
        let p = pinball(&y, &[8.0, 12.0], 0.9);
        assert!((p - (1.8 + 0.2) / 2.0).abs() < 1e-12);
        assert_eq!(pinball(&y, &y, 0.3), 0.0);
    }

    #[test]
    fn test_interval_metrics() {
        let y = vec![1.0, 5.0, 10.0, 3.0];
        let lower = vec![0.0, 5.0, 11.0, 0.0];
        let upper = vec![2.0, 7.0, 12.0, 2.0];
        let m = IntervalMetrics::evaluate("LeafWise", &y, &lower, &upper, 0.1, 0.9);
        assert_eq!(m.model, "LeafWise");
        assert_eq!(m.coverage, 0.5);
        assert_eq!(m.avg_width, 1.75);
        // Midpoints 1, 6, 11.5, 1.
        assert!((m.mae_mid - (0.0 + 1.0 + 1.5 + 2.0) / 4.0).abs() < 1e-12);
        assert!(m.pinball10 >= 0.0 && m.pinball90 >= 0.0);
    }

    #[test]
    fn test_coverage_bounds() {
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(coverage(&y, &y, &y), 1.0);
        assert_eq!(coverage(&y, &[5.0; 3], &[6.0; 3]), 0.0);
        assert!(average_width(&[1.0, 2.0], &[1.0, 4.0]) >= 0.0);
    }
}

//! Split finding
//!
//! Gains are computed from gradient sums and row counts only, since the
//! quantile objective has a constant hessian. Missing values follow whichever
//! side gives the larger gain; when a node has no missing values they follow
//! the larger child.
use crate::histogram::{FeatureHistogram, NodeHistogram};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitParams {
    /// L2 regularization added to every row count.
    pub lambda: f64,
    /// Smallest number of rows allowed in a child.
    pub min_leaf: u32,
    /// Smallest gain worth splitting on.
    pub min_gain: f64,
}

/// Best split found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitInfo {
    pub feature: usize,
    /// Bins `1..=bin` go left.
    pub bin: u16,
    /// Raw value equivalent of `bin`: values below go left.
    pub threshold: f64,
    pub missing_left: bool,
    pub gain: f64,
}

impl SplitInfo {
    /// Whether a row in bin `b` of the split feature goes left.
    #[inline]
    pub fn goes_left(&self, b: u16) -> bool {
        if b == 0 {
            self.missing_left
        } else {
            b <= self.bin
        }
    }
}

/// Gradient sum and row count of a node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeTotals {
    pub grad: f64,
    pub count: u32,
}

impl NodeTotals {
    pub fn from_histogram(hist: &FeatureHistogram) -> Self {
        NodeTotals {
            grad: hist.grad.iter().sum(),
            count: hist.counts.iter().sum(),
        }
    }
}

#[inline]
pub fn score(grad: f64, count: u32, lambda: f64) -> f64 {
    grad * grad / (f64::from(count) + lambda)
}

/// Gain of every candidate split of one feature, as
/// `(bin, missing_left, gain)`, skipping children smaller than
/// `min_leaf` when `enforce_min_leaf` is set.
fn feature_candidates(
    hist: &FeatureHistogram,
    totals: NodeTotals,
    params: &SplitParams,
    enforce_min_leaf: bool,
) -> Vec<(u16, bool, f64)> {
    let parent = score(totals.grad, totals.count, params.lambda);
    let (miss_g, miss_n) = (hist.grad[0], hist.counts[0]);
    let n_bins = hist.grad.len();
    let mut out = Vec::with_capacity(2 * n_bins);
    let mut left_g = 0.0;
    let mut left_n = 0u32;
    // The last non-missing bin can't be a split point, nothing would go right.
    for b in 1..n_bins.saturating_sub(1) {
        left_g += hist.grad[b];
        left_n += hist.counts[b];
        let sides: &[bool] = if miss_n == 0 { &[false] } else { &[false, true] };
        for &missing_left in sides {
            let (lg, ln) = if missing_left {
                (left_g + miss_g, left_n + miss_n)
            } else {
                (left_g, left_n)
            };
            let (rg, rn) = (totals.grad - lg, totals.count - ln);
            if enforce_min_leaf && (ln < params.min_leaf || rn < params.min_leaf) {
                continue;
            }
            if ln == 0 && rn == 0 {
                continue;
            }
            let gain = score(lg, ln, params.lambda) + score(rg, rn, params.lambda) - parent;
            let missing_left = if miss_n == 0 { ln >= rn } else { missing_left };
            out.push((b as u16, missing_left, gain));
        }
    }
    out
}

/// Best split of a single node over the features in `col_index`.
pub fn best_split(
    hist: &NodeHistogram,
    totals: NodeTotals,
    cuts: &[Vec<f64>],
    col_index: &[usize],
    params: &SplitParams,
) -> Option<SplitInfo> {
    let mut best: Option<SplitInfo> = None;
    for &feature in col_index {
        for (bin, missing_left, gain) in feature_candidates(&hist.features[feature], totals, params, true) {
            if gain > params.min_gain && best.map_or(true, |s| gain > s.gain) {
                best = Some(SplitInfo {
                    feature,
                    bin,
                    threshold: cuts[feature][bin as usize - 1],
                    missing_left,
                    gain,
                });
            }
        }
    }
    best
}

/// Best split shared by every node of a level, as in oblivious trees.
///
/// The gain of a candidate is the sum of its gains over all nodes. A node
/// whose rows all fall on one side contributes nothing. The child size limit
/// does not apply since every node must take the same split.
pub fn best_shared_split(
    hists: &[&NodeHistogram],
    totals: &[NodeTotals],
    cuts: &[Vec<f64>],
    col_index: &[usize],
    params: &SplitParams,
) -> Option<SplitInfo> {
    let mut best: Option<SplitInfo> = None;
    for &feature in col_index {
        let n_bins = cuts[feature].len() + 2;
        // gains[b][missing_left]
        let mut gains = vec![[0.0_f64; 2]; n_bins];
        let mut missing_seen = false;
        for (hist, t) in hists.iter().zip(totals) {
            let fh = &hist.features[feature];
            missing_seen |= fh.counts[0] > 0;
            let mut node_gains = vec![[f64::NAN; 2]; n_bins];
            for (bin, missing_left, gain) in feature_candidates(fh, *t, params, false) {
                node_gains[bin as usize][usize::from(missing_left)] = gain;
            }
            for (g, ng) in gains.iter_mut().zip(&node_gains) {
                // Without missing rows in this node both directions are equal.
                let (a, b) = match (ng[0].is_nan(), ng[1].is_nan()) {
                    (false, false) => (ng[0], ng[1]),
                    (false, true) => (ng[0], ng[0]),
                    (true, false) => (ng[1], ng[1]),
                    (true, true) => (0.0, 0.0),
                };
                g[0] += a;
                g[1] += b;
            }
        }
        for (bin, g) in gains.iter().enumerate().take(n_bins - 1).skip(1) {
            let sides: &[usize] = if missing_seen { &[0, 1] } else { &[0] };
            for &side in sides {
                let gain = g[side];
                if gain > params.min_gain && best.map_or(true, |s| gain > s.gain) {
                    best = Some(SplitInfo {
                        feature,
                        bin: bin as u16,
                        threshold: cuts[feature][bin - 1],
                        missing_left: side == 1,
                        gain,
                    });
                }
            }
        }
    }
    best
}

//! Gradient histograms
//!
//! A node histogram holds, for every feature, the gradient sum and row count
//! of each bin over the rows of that node. Features are filled in parallel.
//! A sibling's histogram is the parent's minus the child's, so only the
//! smaller child of a split is ever scanned.
use crate::binning::BinnedData;
use rayon::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureHistogram {
    pub grad: Vec<f64>,
    pub counts: Vec<u32>,
}

impl FeatureHistogram {
    pub fn empty(n_bins: usize) -> Self {
        FeatureHistogram {
            grad: vec![0.0; n_bins],
            counts: vec![0; n_bins],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.grad.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeHistogram {
    /// Indexed by feature; features outside the sampled columns stay empty.
    pub features: Vec<FeatureHistogram>,
}

impl NodeHistogram {
    /// Histogram of `rows` over the features in `col_index`.
    pub fn build(binned: &BinnedData, rows: &[usize], grad: &[f64], col_index: &[usize]) -> Self {
        let mut features = vec![FeatureHistogram::default(); binned.cuts.len()];
        let built: Vec<(usize, FeatureHistogram)> = col_index
            .par_iter()
            .map(|&col| {
                let mut hist = FeatureHistogram::empty(binned.n_bins(col));
                let bins = binned.get_col(col);
                for &r in rows {
                    let b = bins[r] as usize;
                    hist.grad[b] += grad[r];
                    hist.counts[b] += 1;
                }
                (col, hist)
            })
            .collect();
        for (col, hist) in built {
            features[col] = hist;
        }
        NodeHistogram { features }
    }

    /// Histogram of the sibling of `child` under `parent`.
    pub fn from_parent_child(parent: &NodeHistogram, child: &NodeHistogram) -> Self {
        let features = parent
            .features
            .iter()
            .zip(&child.features)
            .map(|(p, c)| FeatureHistogram {
                grad: p.grad.iter().zip(&c.grad).map(|(a, b)| a - b).collect(),
                counts: p.counts.iter().zip(&c.counts).map(|(a, b)| a - b).collect(),
            })
            .collect();
        NodeHistogram { features }
    }
}

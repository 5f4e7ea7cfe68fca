//! Feature binning
//!
//! Every feature is bucketed into at most `max_bin` non-missing bins plus bin
//! zero, which holds missing values. The cut points of a feature are sorted
//! thresholds `t_1 < ... < t_k`; a value `v` lands in bin
//! `1 + #{ j : t_j <= v }`. A split sending bins `1..=b` left is therefore
//! the raw comparison `v < t_b`, which is what trees store for prediction.
use crate::constants::MISSING_BIN;
use crate::data::Matrix;
use crate::errors::PipelineError;
use crate::utils::percentiles_sorted;
use rayon::prelude::*;

#[derive(Debug)]
pub struct BinnedData {
    /// Column major bin numbers, laid out like the source matrix.
    pub binned_data: Vec<u16>,
    /// Cut points of each column.
    pub cuts: Vec<Vec<f64>>,
    pub rows: usize,
}

impl BinnedData {
    /// Number of bins of `col`, the missing bin included.
    pub fn n_bins(&self, col: usize) -> usize {
        self.cuts[col].len() + 2
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.binned_data[col * self.rows + row]
    }

    pub fn get_col(&self, col: usize) -> &[u16] {
        &self.binned_data[col * self.rows..(col + 1) * self.rows]
    }
}

/// Thresholds for one column.
///
/// With few distinct values every distinct value above the minimum becomes a
/// threshold; otherwise thresholds come from evenly spaced percentiles.
fn column_cuts(values: &[f64], max_bin: u16) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let mut unique = sorted.clone();
    unique.dedup();
    if unique.len() <= max_bin as usize {
        return unique.into_iter().skip(1).collect();
    }
    let nbins = f64::from(max_bin);
    let pcts: Vec<f64> = (1..max_bin).map(|i| f64::from(i) / nbins).collect();
    let mut cuts = percentiles_sorted(&sorted, &pcts);
    cuts.dedup();
    let min = sorted[0];
    cuts.retain(|c| *c > min);
    cuts
}

/// Bin of `v` given sorted `cuts`.
#[inline]
pub fn map_bin(cuts: &[f64], v: f64) -> u16 {
    if v.is_nan() {
        return MISSING_BIN;
    }
    // At most `u16::MAX - 2` cuts, so this always fits.
    (cuts.partition_point(|c| *c <= v) + 1) as u16
}

/// Bin a numeric matrix.
///
/// * `data` - A numeric matrix, of data to be binned.
/// * `max_bin` - The number of non-missing bins each column may use.
pub fn bin_matrix(data: &Matrix<f64>, max_bin: u16) -> Result<BinnedData, PipelineError> {
    if max_bin < 2 || max_bin > u16::MAX - 2 {
        return Err(PipelineError::InvalidParameter(
            "max_bin".to_string(),
            format!("a value between 2 and {}", u16::MAX - 2),
            max_bin.to_string(),
        ));
    }
    if data.rows == 0 {
        return Err(PipelineError::EmptyData("cannot bin a matrix without rows".to_string()));
    }
    let cuts: Vec<Vec<f64>> = (0..data.cols)
        .into_par_iter()
        .map(|c| column_cuts(data.get_col(c), max_bin))
        .collect();
    let binned_data = (0..data.cols)
        .into_par_iter()
        .flat_map_iter(|c| {
            let col_cuts = &cuts[c];
            data.get_col(c).iter().map(move |v| map_bin(col_cuts, *v))
        })
        .collect();
    Ok(BinnedData {
        binned_data,
        cuts,
        rows: data.rows,
    })
}
